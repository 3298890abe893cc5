//! # Global runtime configuration.
//!
//! Provides [`RelayConfig`], the centralized settings for the relay runtime.
//!
//! ## Sentinel values
//! - `delivery_timeout = 0s` → no per-request deadline (the original
//!   program imposed none; see [`RelayConfig::request_deadline`])

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Global configuration for the relay runtime.
///
/// Defines:
/// - **Shutdown behavior**: grace period for graceful termination
/// - **Event system**: bus capacity for event delivery
/// - **Reconnect behavior**: backoff policy for route restarts
/// - **HTTP behavior**: connect timeout and optional delivery deadline
///
/// ## Field semantics
/// - `grace`: maximum wait for listeners to stop on shutdown
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `backoff`: reconnect delay curve applied per restart ticket
/// - `connect_timeout`: TCP/TLS establishment deadline for both the
///   subscribe request and deliveries
/// - `delivery_timeout`: whole-request deadline for one POST
///   (`0s` = none)
///
/// All fields are public; prefer the helper accessors over sprinkling
/// sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Maximum time to wait for graceful shutdown before aborting
    /// remaining listeners.
    ///
    /// When a shutdown signal is received:
    /// - Listeners are cancelled via `CancellationToken`
    /// - The supervisor waits up to `grace` for them to exit
    /// - On overrun it returns `RuntimeError::GraceExceeded`
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers lagging behind more than `bus_capacity` events observe
    /// `Lagged` and skip older items. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,

    /// Reconnect backoff policy for route restarts.
    pub backoff: BackoffPolicy,

    /// Connection establishment timeout for outbound HTTP.
    pub connect_timeout: Duration,

    /// Whole-request deadline for one delivery POST.
    ///
    /// - `Duration::ZERO` = no deadline (requests may hang as long as the
    ///   transport allows)
    /// - `> 0` = the POST is abandoned past the deadline and logged as a
    ///   delivery failure
    pub delivery_timeout: Duration,
}

impl RelayConfig {
    /// Returns the per-request delivery deadline as an `Option`.
    ///
    /// - `None` → no deadline
    /// - `Some(d)` → applied to each POST
    #[inline]
    pub fn request_deadline(&self) -> Option<Duration> {
        if self.delivery_timeout == Duration::ZERO {
            None
        } else {
            Some(self.delivery_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for RelayConfig {
    /// Default configuration:
    ///
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    /// - `backoff = BackoffPolicy::default()` (100ms doubling to 30s)
    /// - `connect_timeout = 10s`
    /// - `delivery_timeout = 0s` (no deadline)
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
            backoff: BackoffPolicy::default(),
            connect_timeout: Duration::from_secs(10),
            delivery_timeout: Duration::from_secs(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_delivery_timeout_means_no_deadline() {
        let cfg = RelayConfig::default();
        assert_eq!(cfg.request_deadline(), None);

        let cfg = RelayConfig {
            delivery_timeout: Duration::from_secs(5),
            ..RelayConfig::default()
        };
        assert_eq!(cfg.request_deadline(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_bus_capacity_clamps_to_one() {
        let cfg = RelayConfig {
            bus_capacity: 0,
            ..RelayConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
