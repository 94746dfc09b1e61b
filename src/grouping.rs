//! Alphabetical grouping of fetched users.
//!
//! [`GroupedIndex`] keeps users bucketed by their [`group_key`] together with a
//! case-insensitively sorted list of the keys seen so far. Pages are merged
//! incrementally: users of a later page are appended to their bucket and never
//! reorder earlier entries.

use std::collections::HashMap;

use crate::model::{User, group_key};

#[derive(Clone, Debug, Default)]
pub struct GroupedIndex {
    groups: HashMap<String, Vec<User>>,
    sorted_keys: Vec<String>,
}

impl GroupedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.sorted_keys.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.sorted_keys.is_empty()
    }

    /// Number of sections (distinct keys).
    pub fn len(&self) -> usize {
        self.sorted_keys.len()
    }

    pub fn user_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn sorted_keys(&self) -> &[String] {
        &self.sorted_keys
    }

    pub fn group(&self, key: &str) -> Option<&[User]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Users of the section at `index` in sorted-key order.
    pub fn section(&self, index: usize) -> Option<&[User]> {
        let key = self.sorted_keys.get(index)?;
        self.group(key)
    }

    /// Merge a fetched page into the index.
    pub fn merge_page(&mut self, page: &[User]) {
        let mut incoming: HashMap<String, Vec<User>> = HashMap::new();
        let mut first_seen: Vec<String> = Vec::new();
        for user in page {
            let key = group_key(&user.name);
            let bucket = incoming.entry(key.clone()).or_default();
            if bucket.is_empty() {
                first_seen.push(key);
            }
            bucket.push(user.clone());
        }

        for key in first_seen {
            let Some(users) = incoming.remove(&key) else { continue };
            match self.groups.get_mut(&key) {
                Some(existing) => existing.extend(users),
                None => {
                    self.sorted_keys.push(key.clone());
                    self.groups.insert(key, users);
                }
            }
        }

        // stable: ties keep insertion order
        self.sorted_keys.sort_by_key(|k| k.to_lowercase());
    }
}
