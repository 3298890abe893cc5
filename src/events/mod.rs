//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the supervisor, the
//! stream listeners and the subscriber fan-out workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor`, `core::listener`, `SubscriberSet`
//!   workers (overflow/panic).
//! - **Consumers**: the supervisor's forwarder task (fans out to
//!   `SubscriberSet`).
//!
//! See `core/mod.rs` for the system-level wiring diagram.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
