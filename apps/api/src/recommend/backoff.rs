//! Pure backoff-delay computation for the request executor.
//!
//! The calculation is separated from the sleep: given an attempt index and a
//! jitter sample it is fully deterministic, so tests never need timers.

use std::time::Duration;

use rand::Rng;

/// Attempt cap for one pipeline invocation. Malformed replies and transient
/// errors draw from this same budget.
pub const MAX_ATTEMPTS: u32 = 3;

pub const BASE_DELAY: Duration = Duration::from_secs(1);
pub const MAX_DELAY: Duration = Duration::from_secs(8);

const JITTER_FRACTION: f64 = 0.10;

/// Delay before retrying after failed attempt `attempt` (0-based):
/// `min(BASE_DELAY * 2^attempt, MAX_DELAY)` plus a uniform jitter share in
/// `[0, 10%)` of that value.
///
/// `jitter` is a sample in `[0, 1)`, injected by the caller; see
/// [`jitter_sample`].
pub fn backoff_delay(attempt: u32, jitter: f64) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    let capped = BASE_DELAY.saturating_mul(factor).min(MAX_DELAY);
    capped + capped.mul_f64(JITTER_FRACTION * jitter.clamp(0.0, 1.0))
}

/// Uniform jitter sample in `[0, 1)`.
pub fn jitter_sample() -> f64 {
    rand::thread_rng().gen::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_jitter_doubles_until_cap() {
        assert_eq!(backoff_delay(0, 0.0), Duration::from_secs(1));
        assert_eq!(backoff_delay(1, 0.0), Duration::from_secs(2));
        assert_eq!(backoff_delay(2, 0.0), Duration::from_secs(4));
        assert_eq!(backoff_delay(3, 0.0), Duration::from_secs(8));
        assert_eq!(backoff_delay(4, 0.0), MAX_DELAY);
    }

    #[test]
    fn test_full_jitter_adds_ten_percent() {
        assert_eq!(backoff_delay(0, 1.0), Duration::from_millis(1100));
        assert_eq!(backoff_delay(5, 1.0), Duration::from_millis(8800));
    }

    #[test]
    fn test_delay_bounds_hold_for_all_attempts() {
        let ceiling = MAX_DELAY.mul_f64(1.1);
        for attempt in 0..8u32 {
            for jitter in [0.0, 0.25, 0.999] {
                let delay = backoff_delay(attempt, jitter);
                assert!(delay <= ceiling, "attempt {attempt} exceeded ceiling");
                let floor = BASE_DELAY * 2u32.pow(attempt.min(3));
                if floor <= MAX_DELAY {
                    assert!(delay >= floor, "attempt {attempt} under floor");
                }
            }
        }
    }

    #[test]
    fn test_oversized_attempt_index_saturates() {
        assert_eq!(backoff_delay(40, 0.0), MAX_DELAY);
    }

    #[test]
    fn test_jitter_sample_is_unit_interval() {
        for _ in 0..100 {
            let s = jitter_sample();
            assert!((0.0..1.0).contains(&s));
        }
    }
}
