//! # Built-in logging subscriber.
//!
//! [`LogWriter`] renders runtime events as `tracing` log lines. It is the
//! default sink wired up by the binary; library users can attach their own
//! [`Subscribe`] implementations instead of (or alongside) it.
//!
//! ## Output format
//! ```text
//! now forwarding http://src/stream to http://sink/hook
//! payload from http://src/stream has been sent to http://sink/hook status code 200
//! delivering payload to http://sink/hook failed: connection refused
//! stream from http://src/stream closed: unexpected EOF
//! reconnecting http://src/stream in 200ms (attempt 2)
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

/// Logging subscriber rendering events through `tracing`.
///
/// Delivery outcomes and subscription transitions are logged at info/warn;
/// per-attempt plumbing (connecting, backoff) at debug.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    fn field<'a>(v: &'a Option<std::sync::Arc<str>>) -> &'a str {
        v.as_deref().unwrap_or("<unknown>")
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let source = Self::field(&e.source);
        let target = Self::field(&e.target);
        let reason = Self::field(&e.reason);

        match e.kind {
            EventKind::ListenerConnecting => {
                debug!("subscribing to {source}");
            }
            EventKind::SubscribeFailed => {
                warn!("subscribing to {source} failed: {reason}");
            }
            EventKind::SubscriptionReady => {
                info!("now forwarding {source} to {target}");
            }
            EventKind::StreamClosed => {
                warn!("stream from {source} closed: {reason}");
            }
            EventKind::BackoffScheduled => {
                debug!(
                    "reconnecting {source} in {}ms (attempt {})",
                    e.delay_ms.unwrap_or(0),
                    e.attempt.unwrap_or(0),
                );
            }
            EventKind::ListenerPanicked => {
                error!("listener for {source} panicked: {reason}");
            }
            EventKind::Delivered => {
                info!(
                    "payload from {source} has been sent to {target} status code {}",
                    e.status.unwrap_or(0),
                );
            }
            EventKind::PayloadRejected => {
                warn!("dropping malformed payload from {source}: {reason}");
            }
            EventKind::DeliveryFailed => {
                warn!("delivering payload to {target} failed: {reason}");
            }
            EventKind::ShutdownRequested => {
                info!("shutdown requested ({reason})");
            }
            EventKind::AllStoppedWithin => {
                info!("all listeners stopped within grace period");
            }
            EventKind::GraceExceeded => {
                warn!("shutdown grace exceeded: {reason}");
            }
            EventKind::SubscriberPanicked => {
                error!(
                    "subscriber {} panicked: {reason}",
                    e.subscriber.unwrap_or("<unnamed>"),
                );
            }
            EventKind::SubscriberOverflow => {
                warn!(
                    "subscriber {} dropped an event: {reason}",
                    e.subscriber.unwrap_or("<unnamed>"),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
