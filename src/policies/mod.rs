//! Reconnect timing policies.
//!
//! This module groups the knobs that control **how long** a route waits
//! before its listener is restarted after a termination.
//!
//! ## Contents
//! - [`BackoffPolicy`] how reconnect delays evolve (first / factor / max)
//! - [`JitterPolicy`]  randomization strategy to avoid reconnect storms
//!
//! ## Quick wiring
//! ```text
//! RouteTicket { route, attempt }
//!      └─► core::listener uses backoff.next(attempt - 1) to sleep before
//!          reconnecting; the attempt index travels on the ticket, the
//!          policy itself is stateless.
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=100ms, factor=2.0, max=30s, jitter=None.
//! - `JitterPolicy::None` by default; consider `Equal` for many routes
//!   against the same source.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
