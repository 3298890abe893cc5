//! # xakac
//!
//! **xakac** forwards server-sent events to webhooks.
//!
//! It subscribes to SSE endpoints, turns every data frame into an HTTP
//! POST against the paired webhook target, and keeps each subscription
//! alive forever: a stream that dies is re-queued and re-established with
//! exponential backoff. The crate is both a library and the `xakac`
//! binary built on top of it.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    Route     │   │    Route     │   │    Route     │
//!     │ source→target│   │ source→target│   │ source→target│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (runtime orchestrator)                                │
//! │  - ticket queue (unbounded; one RouteTicket per pending restart)  │
//! │  - Bus (broadcast events)                                         │
//! │  - SubscriberSet (fans out to subscribers)                        │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐     │
//!  │StreamListener│   │StreamListener│   │StreamListener│     │
//!  │ (one pass)   │   │ (one pass)   │   │ (one pass)   │     │
//!  └┬─────────────┘   └┬─────────────┘   └┬─────────────┘     │
//!   │ SSE frames ──► transform ──► POST   │                   │
//!   │                  │                  │                   │
//!   │ publishes        │ publishes        │ publishes         │
//!   │ - Delivered      │ - StreamClosed   │ - SubscribeFailed │
//!   │ - ...            │ - ...            │ - ...             │
//!   ▼                  ▼                  ▼                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                          ┌────────────────┐
//!                          │   forwarder    │
//!                          │ (in Supervisor)│
//!                          └───────┬────────┘
//!                                  ▼
//!                            SubscriberSet
//!                           (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                         worker1  worker2  workerN
//!                         ▼         ▼         ▼
//!                    sub1.on   sub2.on   subN.on
//!                     _event()  _event()  _event()
//! ```
//!
//! ### Subscription lifecycle
//! ```text
//! Route ──► RouteTicket{attempt: 0} ──► queue ──► StreamListener
//!
//! one pass {
//!   ├─► attempt > 0: sleep backoff.next(attempt - 1)   (cancellable)
//!   ├─► GET source (Accept: text/event-stream)
//!   │       │
//!   │       ├─ Err ──► publish SubscribeFailed
//!   │       │          └─► requeue {attempt + 1}
//!   │       │
//!   │       └─ Ok ──► frame loop:
//!   │             ├─ ready ──► publish SubscriptionReady
//!   │             ├─ ping  ──► discard
//!   │             ├─ data  ──► transform ──► POST target
//!   │             │              ├─ Ok  ──► publish Delivered
//!   │             │              └─ Err ──► publish PayloadRejected /
//!   │             │                         DeliveryFailed (frame dropped)
//!   │             └─ close/error ──► publish StreamClosed
//!   │                                └─► requeue {attempt: 1}
//!   │
//!   └─ exit conditions:
//!        - cancellation (OS signal) ─► stop, no requeue
//!        - panic ─► publish ListenerPanicked, requeue {attempt + 1}
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                      |
//! |-------------------|-------------------------------------------------------------------|-----------------------------------------|
//! | **Routes**        | Pair each SSE source with its webhook target (file or env).       | [`Route`], [`routes`]                   |
//! | **Supervision**   | Keep every subscription alive with restart tickets and backoff.   | [`Supervisor`], [`RouteTicket`]         |
//! | **Transform**     | Map JSON payloads onto request body and headers.                  | [`WebhookPayload`], [`RequestDescriptor`] |
//! | **Delivery**      | Fire one POST per data frame, no retries.                         | [`DeliveryClient`]                      |
//! | **Subscriber API**| Hook into runtime events (logging, metrics, custom subscribers).  | [`Subscribe`], [`LogWriter`]            |
//! | **Policies**      | Configure the reconnect delay curve.                              | [`BackoffPolicy`], [`JitterPolicy`]     |
//! | **Errors**        | Typed errors per recovery scope.                                  | [`ConfigError`], [`RuntimeError`]       |
//! | **Configuration** | Centralize runtime settings.                                      | [`RelayConfig`]                         |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use xakac::{LogWriter, RelayConfig, Subscribe, Supervisor, routes};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Routes come from a JSON file or XAKAC_SOURCE_TARGET_* variables.
//!     let routes = routes::discover(None)?;
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];
//!     let sup = Supervisor::new(RelayConfig::default(), subs);
//!
//!     // Runs until SIGINT/SIGTERM/SIGQUIT.
//!     sup.run(routes).await?;
//!     Ok(())
//! }
//! ```
mod core;
mod deliver;
mod error;
mod events;
mod policies;
pub mod routes;
pub mod sse;
mod subscribers;
pub mod transform;

// ---- Public re-exports ----

pub use core::{RelayConfig, RouteTicket, Supervisor};
pub use deliver::DeliveryClient;
pub use error::{ConfigError, DeliveryError, MalformedPayload, RuntimeError, SubscriptionError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use routes::Route;
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use transform::{RequestDescriptor, WebhookPayload};
