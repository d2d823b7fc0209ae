//! `DomainPolicy`: a host's cached robots rules plus its rate limiter (§3).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use texting_robots::Robot;

use crate::limiter::{Limiter, Reservation};

/// Crawl-delay floor used when a host specifies none: the bucket still
/// refills, just fast enough to be "effectively unlimited."
const NOMINAL_MIN_DELAY: Duration = Duration::from_millis(1);

pub struct DomainPolicy {
    /// `None` means no robots rules were found for this host (§4.8: a 404
    /// response) — equivalent to "allow everything."
    rule: Option<Robot>,
    limiter: Limiter,
    created_at: Instant,
    last_touched_millis: AtomicU64,
}

impl DomainPolicy {
    pub fn new(rule: Option<Robot>, crawl_delay: Option<f32>) -> Self {
        let period = crawl_delay
            .filter(|d| *d > 0.0)
            .map(Duration::from_secs_f32)
            .unwrap_or(NOMINAL_MIN_DELAY);
        let created_at = Instant::now();
        Self {
            rule,
            limiter: Limiter::new(period),
            created_at,
            last_touched_millis: AtomicU64::new(0),
        }
    }

    /// Synthesizes a policy that disallows every path on the host, used
    /// when robots.txt is forbidden to fetch or fails to fetch (§4.8).
    pub fn disallow_all() -> Self {
        let txt = b"User-agent: *\nDisallow: /\n";
        let rule = Robot::new("*", txt).ok();
        Self::new(rule, None)
    }

    pub fn allow_all() -> Self {
        Self::new(None, None)
    }

    /// `true` if `path` may be fetched under this host's robots rules.
    pub fn is_allowed(&self, path: &str) -> bool {
        match &self.rule {
            Some(robot) => robot.allowed(path),
            None => true,
        }
    }

    pub fn reserve(&self) -> Reservation<'_> {
        self.limiter.reserve()
    }

    pub fn touch(&self) {
        let elapsed = self.created_at.elapsed().as_millis() as u64;
        self.last_touched_millis.store(elapsed, Ordering::Relaxed);
    }

    pub fn is_stale(&self, evict_after: Duration) -> bool {
        let last_touched = Duration::from_millis(self.last_touched_millis.load(Ordering::Relaxed));
        self.created_at.elapsed().saturating_sub(last_touched) >= evict_after
    }
}
