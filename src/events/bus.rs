//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from multiple sources (listeners, the
//! supervisor, the subscriber fan-out workers).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                   Receiver (one):
//!   Listener 1 ──┐
//!   Listener 2 ──┼──────► Bus ───────► forwarder ────► SubscriberSet
//!   Listener N ──┤  (broadcast chan)  (in Supervisor)
//!   Supervisor ──┘
//! ```
//!
//! A single internal receiver (the supervisor's forwarder task) fans events
//! out to the injected subscribers via
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active receivers at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Thin wrapper over [`tokio::sync::broadcast`] with a `publish`/`subscribe`
/// API. Multiple publishers can publish concurrently; receivers observe
/// clones of each event.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    ///
    /// ### Notes
    /// - Capacity is **shared** across all receivers (not per-subscriber).
    /// - When receivers lag, they will observe `RecvError::Lagged`.
    /// - The minimum capacity is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// Takes ownership of the event; the broadcast channel clones it per
    /// receiver. With no receivers attached the event is dropped silently.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    ///
    /// - Each call creates an **independent** receiver.
    /// - A receiver only gets events **sent after** it subscribes.
    /// - Slow receivers get `RecvError::Lagged(n)` and skip over missed items.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Publishes a borrowed event by cloning it.
    ///
    /// Shorthand for `publish(ev.clone())`, useful when you already hold a
    /// reference.
    pub fn publish_ref(&self, ev: &Event) {
        let _ = self.tx.send(ev.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::event::EventKind;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::ShutdownRequested).with_reason("SIGTERM"));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::ShutdownRequested);
        assert_eq!(ev.reason.as_deref(), Some("SIGTERM"));
    }

    #[test]
    fn test_publish_without_receivers_is_noop() {
        let bus = Bus::new(1);
        bus.publish(Event::new(EventKind::AllStoppedWithin));
    }
}
