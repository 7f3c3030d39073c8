//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Upper bound of the random extra delay, as a fraction of the delay.
const MAX_JITTER: f64 = 0.1;

/// Delay before retry number `retry` (1-based).
///
/// Doubles from `base` on every retry, capped at `max`, then adds up to 10%
/// random jitter so synchronized callers spread out. Retry 0 waits nothing.
pub fn calculate_backoff(retry: u32, base: Duration, max: Duration) -> Duration {
    let Some(exponent) = retry.checked_sub(1) else {
        return Duration::ZERO;
    };

    let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
    let delay = base.saturating_mul(factor).min(max);

    let jitter = rand::thread_rng().gen_range(0.0..MAX_JITTER);
    delay.saturating_add(delay.mul_f64(jitter))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_secs(10);
    const CAP: Duration = Duration::from_secs(60);

    #[test]
    fn test_no_delay_before_first_attempt() {
        assert_eq!(calculate_backoff(0, BASE, CAP), Duration::ZERO);
    }

    #[test]
    fn test_doubles_within_jitter_band() {
        for (retry, expected) in [(1, 10), (2, 20), (3, 40)] {
            let low = Duration::from_secs(expected);
            let delay = calculate_backoff(retry, BASE, CAP);
            assert!(delay >= low, "retry {} waited {:?}", retry, delay);
            assert!(delay <= low.mul_f64(1.0 + MAX_JITTER));
        }
    }

    #[test]
    fn test_huge_cap_saturates() {
        let delay = calculate_backoff(70, Duration::from_secs(u64::MAX / 2), Duration::MAX);
        assert!(delay >= Duration::from_secs(u64::MAX / 2));
    }

    #[test]
    fn test_capped_at_max() {
        for retry in [4, 10, 40] {
            let delay = calculate_backoff(retry, BASE, CAP);
            assert!(delay >= CAP);
            assert!(delay <= CAP.mul_f64(1.0 + MAX_JITTER));
        }
    }
}
