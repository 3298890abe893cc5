//! # Event subscribers for the relay runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`]
//! fan-out, and the built-in [`LogWriter`] sink for runtime events
//! broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Listener ── publish(Event) ──► Bus ──► Supervisor fan-out listener
//!                                              │
//!                                       SubscriberSet::emit
//!                                              │
//!                                   ┌──────────┼──────────┐
//!                                   ▼          ▼          ▼
//!                               LogWriter   metrics    custom ...
//! ```
//!
//! Each subscriber runs behind its own bounded queue and worker task: a slow
//! or panicking sink never blocks the listeners or its siblings.

mod log;
mod subscribe;
mod subscribe_set;

pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscribe_set::SubscriberSet;
