//! Fixed-window rate limiter for outbound model calls.
//!
//! Keeps an ordered window of admission timestamps. An admission purges
//! entries older than the window, then either records the new timestamp or
//! reports how long the caller must wait. This is a fixed-window counter,
//! not a token bucket: a burst straddling a window boundary can briefly
//! exceed the quota. Known limitation, accepted.
//!
//! The limiter is owned by whoever constructs it (no ambient global state)
//! and is shared across handlers behind an `Arc`. The mutex is never held
//! across an await.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Default quota per window.
pub const MAX_REQUESTS_PER_WINDOW: usize = 10;

/// Default window length.
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Blocked { retry_after: Duration },
}

/// Occupancy snapshot for the status endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RateStatus {
    pub count: usize,
    pub limit: usize,
    pub window_secs: u64,
}

pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Checks whether a call may proceed now, recording the timestamp if so.
    pub fn admit(&self) -> Admission {
        self.admit_at(Instant::now())
    }

    /// Admission check against an explicit instant. Tests drive this directly
    /// instead of substituting a clock.
    pub fn admit_at(&self, now: Instant) -> Admission {
        let mut window = self.timestamps.lock().expect("rate window lock poisoned");
        Self::purge(&mut window, now, self.window);

        if window.len() >= self.max_requests {
            let oldest = *window.front().expect("full window cannot be empty");
            match self.window.checked_sub(now.duration_since(oldest)) {
                Some(wait) if !wait.is_zero() => {
                    return Admission::Blocked { retry_after: wait };
                }
                // Clock skew or a stale window: clear and admit.
                _ => window.clear(),
            }
        }

        window.push_back(now);
        Admission::Allowed
    }

    /// Empties the window. Called after a blocked caller has waited out the
    /// reported delay, so the next admission starts from a clean slate.
    pub fn clear(&self) {
        self.timestamps
            .lock()
            .expect("rate window lock poisoned")
            .clear();
    }

    /// Current occupancy, with expired entries purged first.
    pub fn occupancy(&self) -> RateStatus {
        self.occupancy_at(Instant::now())
    }

    pub fn occupancy_at(&self, now: Instant) -> RateStatus {
        let mut window = self.timestamps.lock().expect("rate window lock poisoned");
        Self::purge(&mut window, now, self.window);
        RateStatus {
            count: window.len(),
            limit: self.max_requests,
            window_secs: self.window.as_secs(),
        }
    }

    fn purge(window: &mut VecDeque<Instant>, now: Instant, span: Duration) {
        while let Some(oldest) = window.front() {
            if now.duration_since(*oldest) >= span {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(quota: usize, secs: u64) -> RateLimiter {
        RateLimiter::new(quota, Duration::from_secs(secs))
    }

    #[test]
    fn test_admits_up_to_quota() {
        let rl = limiter(3, 60);
        let t0 = Instant::now();
        for i in 0..3 {
            assert_eq!(
                rl.admit_at(t0 + Duration::from_secs(i)),
                Admission::Allowed
            );
        }
        assert_eq!(rl.occupancy_at(t0 + Duration::from_secs(3)).count, 3);
    }

    #[test]
    fn test_blocks_after_quota_with_wait_from_oldest() {
        let rl = limiter(3, 60);
        let t0 = Instant::now();
        for i in 0..3 {
            rl.admit_at(t0 + Duration::from_secs(i));
        }
        // Oldest admission was at t0; at t0+5 the caller must wait 55s.
        match rl.admit_at(t0 + Duration::from_secs(5)) {
            Admission::Blocked { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(55));
            }
            Admission::Allowed => panic!("expected block at quota"),
        }
    }

    #[test]
    fn test_admits_again_after_window_elapses() {
        let rl = limiter(2, 60);
        let t0 = Instant::now();
        rl.admit_at(t0);
        rl.admit_at(t0 + Duration::from_secs(1));
        assert!(matches!(
            rl.admit_at(t0 + Duration::from_secs(2)),
            Admission::Blocked { .. }
        ));
        // Both entries have aged out a full window later.
        assert_eq!(
            rl.admit_at(t0 + Duration::from_secs(61)),
            Admission::Allowed
        );
    }

    #[test]
    fn test_partial_expiry_frees_one_slot() {
        let rl = limiter(2, 60);
        let t0 = Instant::now();
        rl.admit_at(t0);
        rl.admit_at(t0 + Duration::from_secs(30));
        // t0 entry expires at t0+60; the +30 entry still counts.
        assert_eq!(
            rl.admit_at(t0 + Duration::from_secs(60)),
            Admission::Allowed
        );
        assert!(matches!(
            rl.admit_at(t0 + Duration::from_secs(61)),
            Admission::Blocked { .. }
        ));
    }

    #[test]
    fn test_clear_resets_occupancy() {
        let rl = limiter(2, 60);
        let t0 = Instant::now();
        rl.admit_at(t0);
        rl.admit_at(t0);
        rl.clear();
        assert_eq!(rl.occupancy_at(t0).count, 0);
        assert_eq!(rl.admit_at(t0), Admission::Allowed);
    }

    #[test]
    fn test_occupancy_reports_limit_and_window() {
        let rl = limiter(7, 45);
        let status = rl.occupancy();
        assert_eq!(status.count, 0);
        assert_eq!(status.limit, 7);
        assert_eq!(status.window_secs, 45);
    }

    #[test]
    fn test_blocked_does_not_record_a_timestamp() {
        let rl = limiter(1, 60);
        let t0 = Instant::now();
        rl.admit_at(t0);
        let _ = rl.admit_at(t0 + Duration::from_secs(1));
        assert_eq!(rl.occupancy_at(t0 + Duration::from_secs(1)).count, 1);
    }
}
