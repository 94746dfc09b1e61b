//! In-memory user directory.
//!
//! Used by the `demo` source of the binary and by tests. Clones share state, so
//! a test can keep a handle to inject failures or add users after the source
//! has been handed to a controller.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{SnapshotCursor, UserCursor, UserSource, UsersRequest, matches_keyword};
use crate::error::FetchError;
use crate::model::{User, UserStatus};

#[derive(Default)]
struct Inner {
    users: Mutex<Vec<User>>,
    friends: Mutex<HashSet<String>>,
    failures: Mutex<VecDeque<FetchError>>,
    fetches: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MemorySource {
    inner: Arc<Inner>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemorySource {
    pub fn new(users: Vec<User>) -> Self {
        let source = Self::default();
        *lock(&source.inner.users) = users;
        source
    }

    /// A small fixed directory for trying the UI without a backend.
    pub fn demo() -> Self {
        let names = [
            "alice", "Bob Stone", "bea", "carlos", "Chen Wei", "dana", "Émile", "erin", "farah",
            "gus", "hana", "ivan", "jules", "kai", "lena", "Marta", "mo", "nadia", "oscar",
            "priya", "quinn", "rosa", "sam", "tariq", "uma", "victor", "wen", "xavier", "yuki",
            "zoe", "", "  ari", "bruno", "cleo", "diego", "ellis", "fern", "gita", "hugo",
        ];
        let users = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let status = if i % 4 == 3 {
                    UserStatus::Unavailable
                } else {
                    UserStatus::Available
                };
                User::new(format!("u{:03}", i + 1), *name).with_status(status)
            })
            .collect();
        let source = Self::new(users);
        source.set_friends(["u002", "u004", "u007", "u012", "u019", "u026"]);
        source
    }

    pub fn set_friends<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *lock(&self.inner.friends) = ids.into_iter().map(Into::into).collect();
    }

    pub fn push_user(&self, user: User) {
        lock(&self.inner.users).push(user);
    }

    /// Make the next fetch on any cursor of this source fail with `err`.
    pub fn fail_next(&self, err: FetchError) {
        lock(&self.inner.failures).push_back(err);
    }

    /// Number of `fetch_next` calls served so far, failures included.
    pub fn fetch_count(&self) -> usize {
        self.inner.fetches.load(Ordering::SeqCst)
    }
}

struct MemoryCursor {
    inner: Arc<Inner>,
    snapshot: SnapshotCursor,
}

impl UserCursor for MemoryCursor {
    fn fetch_next(&mut self) -> Result<Vec<User>, FetchError> {
        self.inner.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = lock(&self.inner.failures).pop_front() {
            return Err(err);
        }
        Ok(self.snapshot.next_page())
    }
}

impl UserSource for MemorySource {
    fn create_cursor(&self, request: &UsersRequest) -> Box<dyn UserCursor> {
        let keyword = request.normalized_keyword();
        let friends = lock(&self.inner.friends).clone();
        let users = lock(&self.inner.users)
            .iter()
            .filter(|u| !request.friends_only || friends.contains(&u.id))
            .filter(|u| keyword.as_deref().is_none_or(|k| matches_keyword(u, k)))
            .cloned()
            .collect();
        Box::new(MemoryCursor {
            inner: Arc::clone(&self.inner),
            snapshot: SnapshotCursor::new(users, request.limit),
        })
    }
}
