//! Background page fetching.
//!
//! Fetch jobs run on a [`FetchExecutor`] and report back through an mpsc
//! channel as [`FetchCompletion`]s. The controller drains the channel on the UI
//! thread; a completion only applies if its [`CursorId`] is still the active
//! cursor of its lane.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::error::FetchError;
use crate::model::User;
use crate::source::UserCursor;

/// Identity of a cursor created by the controller. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CursorId(pub u64);

/// What a completed page should do to the list state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchKind {
    /// First page after a refresh.
    Reset,
    /// Following page of the browse cursor.
    Append,
    /// First page of a search query; replaces the results.
    Search,
    /// Following page of the search cursor.
    SearchAppend,
}

impl FetchKind {
    pub fn is_search(self) -> bool {
        matches!(self, FetchKind::Search | FetchKind::SearchAppend)
    }

    /// Kind of the page that continues this one on the same cursor.
    pub fn follow_up(self) -> Self {
        if self.is_search() {
            FetchKind::SearchAppend
        } else {
            FetchKind::Append
        }
    }
}

#[derive(Debug)]
pub struct FetchCompletion {
    pub cursor: CursorId,
    pub kind: FetchKind,
    pub result: Result<Vec<User>, FetchError>,
}

pub type SharedCursor = Arc<Mutex<Box<dyn UserCursor>>>;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs fetch jobs somewhere off (or on) the UI thread.
pub trait FetchExecutor {
    fn execute(&self, job: Job);
}

/// One OS thread per fetch.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadExecutor;

impl FetchExecutor for ThreadExecutor {
    fn execute(&self, job: Job) {
        let spawned = std::thread::Builder::new()
            .name("userdir-fetch".into())
            .spawn(job);
        if let Err(e) = spawned {
            // No completion will arrive; the lane stays busy until a new cursor replaces it.
            tracing::error!(error = %e, "failed to spawn fetch worker");
        }
    }
}

/// Runs the job immediately on the calling thread. The completion is still
/// delivered through the channel, so state changes wait for the next drain.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl FetchExecutor for InlineExecutor {
    fn execute(&self, job: Job) {
        job();
    }
}

/// Build the job that fetches one page from `cursor` and reports it on `tx`.
pub fn fetch_job(
    cursor: SharedCursor,
    id: CursorId,
    kind: FetchKind,
    tx: Sender<FetchCompletion>,
) -> Job {
    Box::new(move || {
        let result = match cursor.lock() {
            Ok(mut c) => c.fetch_next(),
            Err(_) => Err(FetchError::Poisoned),
        };
        if tx
            .send(FetchCompletion {
                cursor: id,
                kind,
                result,
            })
            .is_err()
        {
            tracing::debug!(cursor = id.0, "completion dropped, controller gone");
        }
    })
}
