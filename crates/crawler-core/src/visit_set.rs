//! `VisitSet`: the set of absolute URL strings already scheduled (§3).
//!
//! A URL enters on dequeue, not on enqueue, so the same URL may be queued
//! twice but is processed once. The rate-limit-backoff requeue path is the
//! one exception: it removes and re-inserts rather than checking membership
//! (see the coordinator in `crawler-scheduler`).

use parking_lot::RwLock;
use std::collections::HashSet;

#[derive(Default)]
pub struct VisitSet {
    seen: RwLock<HashSet<String>>,
}

impl VisitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` visited, returning `true` if it was not already present
    /// (i.e. the caller should proceed with processing it).
    pub fn mark_visited(&self, url: &str) -> bool {
        self.seen.write().insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.read().contains(url)
    }

    /// Removes `url` so a subsequent `mark_visited` succeeds again; used by
    /// the rate-limit requeue path.
    pub fn remove(&self, url: &str) {
        self.seen.write().remove(url);
    }

    pub fn len(&self) -> usize {
        self.seen.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
