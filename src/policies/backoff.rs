//! # Reconnect backoff policy.
//!
//! [`BackoffPolicy`] controls how long a route waits before its next
//! subscription attempt after a failure. It is parameterized by:
//! - [`BackoffPolicy::first`] the delay before the first retry;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the delay cap.
//!
//! The delay for attempt `n` is `first × factor^n`, clamped to `max`, then
//! jitter is applied. The attempt index is carried on the restart ticket a
//! terminating listener pushes back onto the supervisor queue, so the policy
//! itself holds no mutable state and the jittered output never feeds back
//! into later calculations.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use xakac::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! // Attempt 0 — uses `first` (100ms)
//! assert_eq!(backoff.next(0), Duration::from_millis(100));
//!
//! // Attempt 1 — first × factor^1 = 200ms
//! assert_eq!(backoff.next(1), Duration::from_millis(200));
//!
//! // Attempt 10 — 100ms × 2^10 = 102_400ms → capped at max=10s
//! assert_eq!(backoff.next(10), Duration::from_secs(10));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Reconnect backoff policy for route restarts.
///
/// A route that fails to connect repeatedly sees its delay grow by
/// [`BackoffPolicy::factor`] per consecutive failure, up to
/// [`BackoffPolicy::max`]. A route whose subscription was established and
/// later dropped restarts from [`BackoffPolicy::first`].
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay before the first reconnect attempt.
    pub first: Duration,
    /// Maximum delay cap.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter policy to prevent synchronized reconnect storms.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns the default reconnect curve:
    /// - `first = 100ms`;
    /// - `factor = 2.0` (doubling);
    /// - `max = 30s`;
    /// - no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            jitter: JitterPolicy::None,
            factor: 2.0,
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay for the given attempt number (0-indexed).
    ///
    /// The base delay is `first × factor^attempt`, clamped to
    /// [`BackoffPolicy::max`]. Jitter is applied to the clamped base; each
    /// attempt derives its base independently from the attempt index alone.
    ///
    /// # Notes
    /// - `factor = 1.0` keeps the delay constant at `first` (up to `max`).
    /// - Non-finite or overflowing intermediates clamp to `max`.
    pub fn next(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let clamped_exp = attempt.min(i32::MAX as u32) as i32;
        let unclamped_secs = self.first.as_secs_f64() * self.factor.powi(clamped_exp);

        let base =
            if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs {
                self.max
            } else {
                Duration::from_secs_f64(unclamped_secs)
            };

        self.jitter.apply(base, self.first.min(self.max), self.max)
    }
}
