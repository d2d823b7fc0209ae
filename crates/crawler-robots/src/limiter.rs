//! Token-bucket rate limiter, capacity 1, matching a host's `Crawl-delay`.
//!
//! Capacity is fixed at 1 because the scheduler only ever asks "can I make
//! one more request to this host right now, or how long until I can."
//! There is no notion of bursting across hosts.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

struct State {
    /// Earliest instant at which a reservation can be granted with zero
    /// delay. Each `reserve()` call advances this by `period`, whether or
    /// not the caller ends up waiting.
    next_available: Instant,
    period: Duration,
}

pub struct Limiter {
    state: Mutex<State>,
}

impl Limiter {
    /// `period` is the refill interval (the host's `Crawl-delay`). Treated
    /// as "effectively unlimited" by callers passing a nominal minimum when
    /// the host specifies no delay; never allowed to be exactly zero here so
    /// the bucket always makes forward progress.
    pub fn new(period: Duration) -> Self {
        Self {
            state: Mutex::new(State {
                next_available: Instant::now(),
                period: period.max(Duration::from_nanos(1)),
            }),
        }
    }

    /// Reserves the bucket's single token, returning how long the caller
    /// must wait before acting on it. Always succeeds: this limiter has no
    /// notion of an un-grantable reservation, only an arbitrarily long
    /// delay, so `Reservation::ok` is a documented always-true simplification.
    pub fn reserve(&self) -> Reservation<'_> {
        let mut state = self.state.lock();
        let now = Instant::now();
        let start = state.next_available.max(now);
        let delay = start.saturating_duration_since(now);
        let previous = state.next_available;
        let granted = start + state.period;
        state.next_available = granted;
        Reservation { limiter: self, delay, previous, granted }
    }
}

/// A grant of the bucket's token, returned by `Limiter::reserve`.
///
/// If the caller decides not to use the reservation (the scheduler's
/// rate-limit-requeue path, §4.10 step 4), call `cancel` to give the token
/// back — but only if no later reservation has already been granted, since
/// that would make the bucket double-spend.
pub struct Reservation<'a> {
    limiter: &'a Limiter,
    delay: Duration,
    previous: Instant,
    granted: Instant,
}

impl Reservation<'_> {
    pub fn ok(&self) -> bool {
        true
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Rolls back this reservation's effect on the bucket, provided nothing
    /// has reserved after it. A no-op otherwise: once another reservation
    /// has been granted, undoing this one would hand out two tokens.
    pub fn cancel(self) {
        let mut state = self.limiter.state.lock();
        if state.next_available == self.granted {
            state.next_available = self.previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reservation_has_no_delay() {
        let limiter = Limiter::new(Duration::from_millis(100));
        let r = limiter.reserve();
        assert!(r.ok());
        assert_eq!(r.delay(), Duration::ZERO);
    }

    #[test]
    fn second_reservation_is_delayed_by_roughly_the_period() {
        let limiter = Limiter::new(Duration::from_millis(200));
        let first = limiter.reserve();
        assert_eq!(first.delay(), Duration::ZERO);
        let second = limiter.reserve();
        assert!(second.delay() > Duration::ZERO);
        assert!(second.delay() <= Duration::from_millis(200));
    }

    #[test]
    fn cancel_returns_the_token_when_nothing_reserved_since() {
        let limiter = Limiter::new(Duration::from_millis(200));
        let first = limiter.reserve();
        first.cancel();
        let second = limiter.reserve();
        assert_eq!(second.delay(), Duration::ZERO);
    }

    #[test]
    fn cancel_is_a_no_op_once_superseded() {
        let limiter = Limiter::new(Duration::from_millis(200));
        let first = limiter.reserve();
        let second = limiter.reserve();
        first.cancel();
        // second's grant stands; a third reservation still queues behind it.
        assert!(second.delay() > Duration::ZERO);
        let third = limiter.reserve();
        assert!(third.delay() >= second.delay());
    }
}
