//! # Runtime events emitted by the supervisor and stream listeners.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Listener lifecycle**: subscription flow (connecting, ready, closed, backoff)
//! - **Delivery outcomes**: per-frame results (delivered, rejected, failed)
//! - **Runtime events**: shutdown phases and subscriber fan-out incidents
//!
//! The [`Event`] struct carries optional metadata such as the route's source
//! and target, attempt counters, delays, HTTP status and failure reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! observed out of order.
//!
//! ## Example
//! ```rust
//! use xakac::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::DeliveryFailed)
//!     .with_source("http://src.local/stream")
//!     .with_target("http://sink.local/hook")
//!     .with_reason("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::DeliveryFailed);
//! assert_eq!(ev.target.as_deref(), Some("http://sink.local/hook"));
//! assert_eq!(ev.reason.as_deref(), Some("connection refused"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Listener lifecycle events ===
    /// Listener is about to issue a subscribe request for its route.
    ///
    /// Sets:
    /// - `source`: stream URL
    /// - `attempt`: consecutive failure count carried by the ticket
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ListenerConnecting,

    /// Subscribe request failed (transport error, bad status, wrong
    /// content type). The route is re-enqueued with a grown attempt.
    ///
    /// Sets:
    /// - `source`: stream URL
    /// - `attempt`: the failed attempt number
    /// - `reason`: failure message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscribeFailed,

    /// The source announced the subscription is live (`ready` frame).
    ///
    /// Sets:
    /// - `source`: stream URL
    /// - `target`: webhook URL
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriptionReady,

    /// An established stream ended (remote close or transport error).
    /// The route is re-enqueued starting from the base delay.
    ///
    /// Sets:
    /// - `source`: stream URL
    /// - `reason`: close/error message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    StreamClosed,

    /// Reconnect delay scheduled before the next subscribe attempt.
    ///
    /// Sets:
    /// - `source`: stream URL
    /// - `attempt`: attempt the delay was computed for
    /// - `delay_ms`: delay before reconnecting (ms)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    BackoffScheduled,

    /// Listener body panicked. The panic is contained and the route is
    /// re-enqueued like any other failure.
    ///
    /// Sets:
    /// - `source`: stream URL
    /// - `reason`: panic payload, if printable
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ListenerPanicked,

    // === Delivery outcomes ===
    /// A data frame was posted and the target answered with some status.
    /// Any status counts; non-2xx is informational, not a failure.
    ///
    /// Sets:
    /// - `source`: stream URL
    /// - `target`: webhook URL
    /// - `status`: numeric HTTP status
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Delivered,

    /// A data frame did not decode as a JSON object and was dropped.
    ///
    /// Sets:
    /// - `source`: stream URL
    /// - `reason`: decode error
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    PayloadRejected,

    /// The POST never produced a response (DNS, refused, timeout) or the
    /// payload carried header material that is not legal HTTP. The frame
    /// is dropped; the subscription continues.
    ///
    /// Sets:
    /// - `source`: stream URL
    /// - `target`: webhook URL
    /// - `reason`: rendered cause chain
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    DeliveryFailed,

    // === Shutdown events ===
    /// Shutdown requested (OS signal observed).
    ///
    /// Sets:
    /// - `reason`: signal name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ShutdownRequested,

    /// All listeners stopped within the configured grace period.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    AllStoppedWithin,

    /// Grace period exceeded; some listeners did not stop in time and
    /// were aborted.
    ///
    /// Sets:
    /// - `reason`: count of stuck listeners
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    GraceExceeded,

    // === Subscriber fan-out incidents ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: panic info/message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Stream URL of the route, if applicable.
    pub source: Option<Arc<str>>,
    /// Webhook URL of the route, if applicable.
    pub target: Option<Arc<str>>,
    /// Consecutive failure count from the restart ticket.
    pub attempt: Option<u32>,
    /// Reconnect delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// HTTP status answered by the target.
    pub status: Option<u16>,
    /// Human-readable reason (errors, panic info, signal names).
    pub reason: Option<Arc<str>>,
    /// Name of the fan-out subscriber, for subscriber incidents.
    pub subscriber: Option<&'static str>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and
    /// next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            target: None,
            attempt: None,
            delay_ms: None,
            status: None,
            reason: None,
            subscriber: None,
        }
    }

    /// Attaches the route's stream URL.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches the route's webhook URL.
    #[inline]
    pub fn with_target(mut self, target: impl Into<Arc<str>>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a reconnect delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches the HTTP status answered by the target.
    #[inline]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow).with_reason(reason);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::ShutdownRequested);
        let b = Event::new(EventKind::ShutdownRequested);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builders_set_fields() {
        let ev = Event::new(EventKind::Delivered)
            .with_source("s")
            .with_target("t")
            .with_status(204)
            .with_attempt(2)
            .with_delay(Duration::from_millis(150));

        assert_eq!(ev.source.as_deref(), Some("s"));
        assert_eq!(ev.target.as_deref(), Some("t"));
        assert_eq!(ev.status, Some(204));
        assert_eq!(ev.attempt, Some(2));
        assert_eq!(ev.delay_ms, Some(150));
        assert!(ev.reason.is_none());
    }

    #[test]
    fn test_delay_clamps_to_u32() {
        let ev = Event::new(EventKind::BackoffScheduled)
            .with_delay(Duration::from_secs(u64::from(u32::MAX)));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }

    #[test]
    fn test_subscriber_helpers() {
        let ev = Event::subscriber_overflow("logger", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.subscriber, Some("logger"));

        let ev = Event::subscriber_panicked("logger", "boom".to_string());
        assert!(ev.is_subscriber_panic());
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }
}
