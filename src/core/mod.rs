//! Runtime core: orchestration and lifecycle.
//!
//! This module contains the relay runtime. The public API from here is
//! [`Supervisor`] (with its [`RouteTicket`] queue unit) and
//! [`RelayConfig`]; the listener state machine stays internal.
//!
//! Internal modules:
//! - [`supervisor`]: route queue, listener lifecycle, graceful shutdown;
//! - [`listener`]: one subscription pass per ticket, frame handling;
//! - [`shutdown`]: cross-platform shutdown signal handling;
//! - [`config`]: runtime configuration.

mod config;
mod listener;
mod shutdown;
mod supervisor;

pub use config::RelayConfig;
pub use supervisor::{RouteTicket, Supervisor};
