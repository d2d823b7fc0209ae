//! A waitgroup: a counter of "jobs enqueued but not yet fully processed,"
//! shared between the scheduler's dispatcher and the fetcher's link
//! extraction (§4.9, §4.10).

use std::sync::atomic::{AtomicI64, Ordering};

use tokio::sync::Notify;

#[derive(Default)]
pub struct WaitGroup {
    count: AtomicI64,
    notify: Notify,
}

impl WaitGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the outstanding count by `n`. Used both for each seed
    /// enqueued at startup and, critically, for each link discovered on a
    /// page — incremented BEFORE the links are sent to the job queue so the
    /// reaper can never observe a false zero.
    pub fn add(&self, n: i64) {
        self.count.fetch_add(n, Ordering::SeqCst);
    }

    /// Marks one unit of work complete.
    pub fn done(&self) {
        let previous = self.count.fetch_sub(1, Ordering::SeqCst);
        if previous - 1 <= 0 {
            self.notify.notify_waiters();
        }
    }

    /// Resolves once the count reaches zero (or below, which should not
    /// happen in a correct caller but is tolerated rather than panicking).
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.count.load(Ordering::SeqCst) <= 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn count(&self) -> i64 {
        self.count.load(Ordering::SeqCst)
    }
}
