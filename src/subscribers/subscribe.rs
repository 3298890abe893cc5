//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging event consumers into the
//! relay runtime. Each subscriber is driven by a dedicated worker loop fed by
//! a bounded queue owned by the
//! [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching) – they do **not** block the
//!   publisher, the listeners, nor other subscribers.
//! - Each subscriber **declares** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. If a queue overflows, events for that
//!   subscriber are **dropped** (warn).
//!
//! ## Example (skeleton)
//! ```rust
//! use xakac::{Event, EventKind, Subscribe};
//!
//! struct DeliveryCounter(std::sync::atomic::AtomicU64);
//!
//! #[async_trait::async_trait]
//! impl Subscribe for DeliveryCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::Delivered {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "delivery-counter" }
//! }
//! ```

use crate::events::Event;
use async_trait::async_trait;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should
/// avoid blocking the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    ///
    /// # Parameters
    /// - `event`: Reference to the event (does not transfer ownership)
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    ///
    /// On overflow, events for this subscriber are **dropped** (warn).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
