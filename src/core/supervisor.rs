//! # Supervisor: owns the route queue, listener lifecycle, and shutdown.
//!
//! The [`Supervisor`] owns the event bus, a [`SubscriberSet`], and the
//! runtime configuration. It seeds one [`RouteTicket`] per configured
//! route, spawns a [`StreamListener`](crate::core::listener::StreamListener)
//! per ticket, and keeps doing so for every restart ticket the listeners
//! queue back, until a termination signal arrives.
//!
//! ## High-level architecture
//! ```text
//! Inputs to run():
//!   Vec<Route> ──► seed tickets {route, attempt: 0} ──► unbounded queue
//!
//! Main loop (select):
//!   ├─ queue.recv() ──► StreamListener::new(ticket, ctx)
//!   │                        └─► set.spawn(listener.run(child_token))
//!   ├─ set.join_next() ──► reap finished listeners
//!   └─ shutdown signal ──► drain (below)
//!
//! Restart path:
//!   listener ── requeue {route, attempt} ──► queue ──► main loop
//!
//! Event flow:
//!   listeners ── publish(Event) ──► Bus ──► forwarder ──► SubscriberSet::emit
//!                                                   ┌─────────┬─────────┐
//!                                                   ▼         ▼         ▼
//!                                            [queue S1] [queue S2] ... [queue SN]
//!                                             worker S1  worker S2 ...  worker SN
//!
//! Shutdown path:
//!   signal ─► publish ShutdownRequested ─► cancel root token
//!          ─► wait for listeners within cfg.grace:
//!                ├─ all joined   → publish AllStoppedWithin
//!                └─ grace passed → publish GraceExceeded, abort the rest
//!          ─► drain the forwarder, flush subscriber queues
//! ```
//!
//! The queue is unbounded: a restart ticket must never be dropped, and
//! the ticket population is bounded by the route count (each route has at
//! most one listener or one queued ticket at any time).
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use xakac::{LogWriter, RelayConfig, Route, Subscribe, Supervisor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let routes = vec![Route {
//!         source: "http://127.0.0.1:8080/stream".into(),
//!         target: "http://127.0.0.1:9090/hook".into(),
//!     }];
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];
//!     let sup = Supervisor::new(RelayConfig::default(), subs);
//!     sup.run(routes).await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::core::config::RelayConfig;
use crate::core::listener::{ListenerContext, StreamListener};
use crate::core::shutdown;
use crate::deliver::DeliveryClient;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::routes::Route;
use crate::subscribers::{Subscribe, SubscriberSet};

/// One unit of work on the supervisor queue: subscribe to `route`, with
/// the backoff state carried alongside.
///
/// `attempt = 0` connects immediately (initial subscription). Every
/// restart arrives with `attempt > 0`, and the listener sleeps the
/// backoff delay for `attempt - 1` before connecting.
#[derive(Clone, Debug)]
pub struct RouteTicket {
    /// The route to serve.
    pub route: Route,
    /// Restart counter driving the backoff delay.
    pub attempt: u32,
}

impl RouteTicket {
    /// Ticket for the initial subscription of a route.
    #[must_use]
    pub fn seed(route: Route) -> Self {
        Self { route, attempt: 0 }
    }
}

/// Coordinates stream listeners, event delivery, and graceful shutdown.
pub struct Supervisor {
    /// Global runtime configuration.
    pub cfg: RelayConfig,
    /// Event bus shared with all listeners.
    pub bus: Bus,
    /// Fan-out set for subscribers.
    pub subs: Arc<SubscriberSet>,
}

impl Supervisor {
    /// Creates a supervisor with the given config and subscribers.
    pub fn new(cfg: RelayConfig, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));
        Self { cfg, bus, subs }
    }

    /// Runs the relay until a termination signal arrives.
    ///
    /// Listeners restart forever on their own; the only way out of the
    /// main loop is the signal. The shutdown sequence may end with
    /// [`RuntimeError::GraceExceeded`] when listeners outlive the grace
    /// period.
    pub async fn run(self, routes: Vec<Route>) -> Result<(), RuntimeError> {
        let signal = async {
            match shutdown::wait_for_shutdown_signal().await {
                Ok(name) => name.to_owned(),
                Err(err) => format!("signal listener failed: {err}"),
            }
        };
        self.run_until(routes, signal).await
    }

    /// Runs the relay until `shutdown` completes; its output becomes the
    /// reason on the [`EventKind::ShutdownRequested`] event.
    pub async fn run_until<F>(self, routes: Vec<Route>, shutdown: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = String>,
    {
        let (ctx, mut tickets) = self.build_context()?;
        for route in routes {
            // The receiver outlives this loop; the send cannot fail.
            let _ = ctx.requeue.send(RouteTicket::seed(route));
        }

        let flush = CancellationToken::new();
        let forwarder = self.spawn_forwarder(flush.clone());

        let token = CancellationToken::new();
        let mut set = JoinSet::new();

        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                reason = &mut shutdown => {
                    self.bus
                        .publish(Event::new(EventKind::ShutdownRequested).with_reason(reason));
                    token.cancel();
                    break self.wait_all_with_grace(&mut set).await;
                }
                Some(ticket) = tickets.recv() => {
                    let listener = StreamListener::new(ticket, ctx.clone());
                    set.spawn(listener.run(token.child_token()));
                }
                Some(_) = set.join_next(), if !set.is_empty() => {}
            }
        };

        // Everything that will ever be published has been; drain the
        // forwarder, then flush the per-subscriber queues.
        flush.cancel();
        let _ = forwarder.await;
        match Arc::try_unwrap(self.subs) {
            Ok(subs) => subs.shutdown().await,
            Err(subs) => {
                // The awaited forwarder held the only other handle; a
                // clone surviving to this point skips the queue flush.
                debug_assert!(
                    false,
                    "subscriber set still shared at shutdown ({} handles)",
                    Arc::strong_count(&subs)
                );
            }
        }
        result
    }

    /// Builds the shared listener handles and the restart queue.
    ///
    /// The subscribe client carries no whole-request deadline (one would
    /// kill the open-ended stream response) and keeps no idle
    /// connections: every reconnect is a fresh connection.
    fn build_context(
        &self,
    ) -> Result<(ListenerContext, mpsc::UnboundedReceiver<RouteTicket>), RuntimeError> {
        let stream = reqwest::Client::builder()
            .connect_timeout(self.cfg.connect_timeout)
            .pool_max_idle_per_host(0)
            .tcp_nodelay(true)
            .build()
            .map_err(|source| RuntimeError::Client { source })?;
        let delivery =
            DeliveryClient::new(&self.cfg).map_err(|source| RuntimeError::Client { source })?;

        let (requeue, tickets) = mpsc::unbounded_channel();
        let ctx = ListenerContext {
            bus: self.bus.clone(),
            stream,
            delivery,
            backoff: self.cfg.backoff,
            requeue,
        };
        Ok((ctx, tickets))
    }

    /// Forwards bus events to the subscriber set until told to flush.
    ///
    /// On the flush signal the broadcast backlog is drained first so the
    /// final shutdown events still reach the subscribers.
    fn spawn_forwarder(&self, flush: CancellationToken) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let subs = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    recv = rx.recv() => match recv {
                        Ok(ev) => subs.emit(&ev),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    },
                    _ = flush.cancelled() => {
                        loop {
                            match rx.try_recv() {
                                Ok(ev) => subs.emit(&ev),
                                Err(TryRecvError::Lagged(_)) => continue,
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
        })
    }

    /// Waits for all listeners to finish within the configured grace
    /// period; the stragglers are aborted past it.
    async fn wait_all_with_grace(&self, set: &mut JoinSet<()>) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        let done = async { while set.join_next().await.is_some() {} };
        let timed = tokio::time::timeout(grace, done).await;

        match timed {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck = set.len();
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded)
                        .with_reason(format!("{stuck} listener(s) still running")),
                );
                set.abort_all();
                while set.join_next().await.is_some() {}
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}
