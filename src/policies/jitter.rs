//! # Jitter for reconnect delays.
//!
//! A source endpoint that drops out takes every route subscribed to it
//! down at once, and the exponential curve alone would schedule all their
//! reconnects for the same instants. [`JitterPolicy`] spreads those
//! reconnects by randomizing each computed delay.
//!
//! Ordered by how much of the computed delay survives:
//! - [`JitterPolicy::None`] keeps the delay exactly;
//! - [`JitterPolicy::Equal`] keeps half and randomizes the other half;
//! - [`JitterPolicy::Full`] randomizes the whole range down to zero;
//! - [`JitterPolicy::Decorrelated`] samples between a fixed floor and
//!   three times the computed delay.

use std::time::Duration;

use rand::Rng;

/// Randomization applied on top of a computed reconnect delay.
///
/// [`BackoffPolicy::next`](crate::BackoffPolicy::next) derives every delay
/// from the attempt index alone, so a sampled value never feeds back into
/// later attempts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Exact delays, no sampling. Right for single routes and for tests
    /// that assert on timing.
    #[default]
    None,

    /// Uniform over `[delay/2, delay]`: spreads reconnects while keeping
    /// at least half the computed wait.
    Equal,

    /// Uniform over `[0, delay]`: strongest spreading, and a delay may
    /// collapse to zero.
    Full,

    /// Uniform over `[floor, 3 × delay]`, capped: widens past the
    /// computed delay on late attempts but never drops below the floor.
    Decorrelated,
}

impl JitterPolicy {
    /// Samples the delay a route actually waits before reconnecting.
    ///
    /// `delay` is the clamped output of the backoff curve for this
    /// attempt. `floor` and `cap` bound the
    /// [`Decorrelated`](Self::Decorrelated) range; the other variants
    /// need no context beyond `delay`.
    #[must_use]
    pub fn apply(&self, delay: Duration, floor: Duration, cap: Duration) -> Duration {
        let delay_ms = delay.as_millis() as u64;
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Equal => {
                let half = delay_ms / 2;
                Duration::from_millis(half + sample_up_to(half))
            }
            JitterPolicy::Full => Duration::from_millis(sample_up_to(delay_ms)),
            JitterPolicy::Decorrelated => {
                let floor_ms = floor.as_millis() as u64;
                let upper = delay_ms
                    .saturating_mul(3)
                    .min(cap.as_millis() as u64)
                    .max(floor_ms);
                if floor_ms >= upper {
                    return floor;
                }
                Duration::from_millis(rand::rng().random_range(floor_ms..=upper))
            }
        }
    }
}

/// Uniform sample from `[0, limit_ms]`, tolerating an empty range.
fn sample_up_to(limit_ms: u64) -> u64 {
    if limit_ms == 0 {
        return 0;
    }
    rand::rng().random_range(0..=limit_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_default_is_no_jitter() {
        assert_eq!(JitterPolicy::default(), JitterPolicy::None);
    }

    #[test]
    fn test_none_keeps_the_computed_delay() {
        assert_eq!(
            JitterPolicy::None.apply(ms(700), ms(100), ms(30_000)),
            ms(700)
        );
    }

    #[test]
    fn test_equal_keeps_at_least_half() {
        for _ in 0..100 {
            let delay = JitterPolicy::Equal.apply(ms(1_000), ms(100), ms(30_000));
            assert!(delay >= ms(500), "below half: {:?}", delay);
            assert!(delay <= ms(1_000), "above the computed delay: {:?}", delay);
        }
    }

    #[test]
    fn test_full_never_exceeds_the_computed_delay() {
        for _ in 0..100 {
            let delay = JitterPolicy::Full.apply(ms(400), ms(100), ms(30_000));
            assert!(delay <= ms(400), "above the computed delay: {:?}", delay);
        }
    }

    #[test]
    fn test_full_zero_delay_stays_zero() {
        assert_eq!(
            JitterPolicy::Full.apply(Duration::ZERO, ms(100), ms(30_000)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_decorrelated_honors_floor_and_cap() {
        for _ in 0..100 {
            let delay = JitterPolicy::Decorrelated.apply(ms(800), ms(100), ms(2_000));
            assert!(delay >= ms(100), "below floor: {:?}", delay);
            assert!(delay <= ms(2_000), "above cap: {:?}", delay);
        }
    }

    #[test]
    fn test_decorrelated_can_overshoot_the_computed_delay() {
        let overshoot = (0..200)
            .any(|_| JitterPolicy::Decorrelated.apply(ms(800), ms(100), ms(30_000)) > ms(800));
        assert!(overshoot, "no sample ever widened past the computed delay");
    }

    #[test]
    fn test_decorrelated_collapsed_range_returns_the_floor() {
        assert_eq!(
            JitterPolicy::Decorrelated.apply(ms(50), ms(400), ms(200)),
            ms(400)
        );
    }
}
