//! # StreamListener: one subscription attempt for one route.
//!
//! A listener is spawned per [`RouteTicket`] and drives a single pass of
//! the subscription state machine:
//!
//! ```text
//! ticket.attempt > 0 ──► sleep backoff.next(attempt - 1)   (cancellable)
//!          │
//!          ▼
//! ListenerConnecting ──► sse::subscribe()
//!          │                   │
//!          │                   ├─ Err ──► SubscribeFailed ──► requeue attempt+1
//!          │                   ▼
//!          │             frame loop
//!          │                   ├─ ready ──► SubscriptionReady
//!          │                   ├─ ping  ──► (discard)
//!          │                   ├─ data  ──► transform ──► deliver
//!          │                   │             │    └─ Err ──► PayloadRejected /
//!          │                   │             │               DeliveryFailed  (frame dropped)
//!          │                   │             └─ Ok ───► Delivered
//!          │                   └─ close/error ──► StreamClosed ──► requeue attempt=1
//!          ▼
//! cancellation at any wait point ──► stop, no requeue
//! ```
//!
//! ## Rules
//! - Frames of one stream are processed **sequentially**; a delivery in
//!   flight finishes before the next frame is read.
//! - A failure to connect escalates the attempt counter; a stream that
//!   dies after being established restarts from attempt 1 so the base
//!   delay always separates reconnects.
//! - A panic anywhere in the pass is caught, published as
//!   [`EventKind::ListenerPanicked`], and converted into a restart.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::supervisor::RouteTicket;
use crate::deliver::DeliveryClient;
use crate::error::{render_chain, SubscriptionError};
use crate::events::{Bus, Event, EventKind};
use crate::policies::BackoffPolicy;
use crate::routes::Route;
use crate::sse::{self, Frame, FrameKind};
use crate::transform;

/// Handles shared by every listener of one supervisor.
#[derive(Clone)]
pub(crate) struct ListenerContext {
    /// Event bus for lifecycle and delivery events.
    pub bus: Bus,
    /// Client for the long-lived subscribe GET.
    pub stream: reqwest::Client,
    /// Client for webhook POSTs.
    pub delivery: DeliveryClient,
    /// Reconnect delay curve.
    pub backoff: BackoffPolicy,
    /// Queue back into the supervisor for restart tickets.
    pub requeue: mpsc::UnboundedSender<RouteTicket>,
}

/// How a listener pass ended.
enum Outcome {
    /// Cancelled by shutdown; the route is not requeued.
    Stop,
    /// The subscription ended; requeue with this attempt number.
    Restart(u32),
}

/// Runs one subscription pass for one ticket.
pub(crate) struct StreamListener {
    ticket: RouteTicket,
    ctx: ListenerContext,
}

impl StreamListener {
    pub fn new(ticket: RouteTicket, ctx: ListenerContext) -> Self {
        Self { ticket, ctx }
    }

    /// Drives the pass to completion and requeues the route if it should
    /// be retried. Panics inside the pass are caught here so one broken
    /// route can never take the supervisor down.
    pub async fn run(self, token: CancellationToken) {
        let pass = AssertUnwindSafe(self.serve(&token)).catch_unwind();
        match pass.await {
            Ok(Outcome::Stop) => {}
            Ok(Outcome::Restart(attempt)) => self.requeue(attempt),
            Err(panic) => {
                self.ctx.bus.publish(
                    Event::new(EventKind::ListenerPanicked)
                        .with_source(self.ticket.route.source.as_str())
                        .with_reason(panic_reason(panic.as_ref())),
                );
                self.requeue(self.ticket.attempt.saturating_add(1));
            }
        }
    }

    fn requeue(&self, attempt: u32) {
        let ticket = RouteTicket {
            route: self.ticket.route.clone(),
            attempt,
        };
        // A closed queue means the supervisor is already shutting down;
        // the ticket is intentionally lost.
        let _ = self.ctx.requeue.send(ticket);
    }

    /// One full pass: backoff wait, connect, then the frame loop.
    async fn serve(&self, token: &CancellationToken) -> Outcome {
        let route = &self.ticket.route;
        let attempt = self.ticket.attempt;

        if attempt > 0 {
            let delay = self.ctx.backoff.next(attempt - 1);
            self.ctx.bus.publish(
                Event::new(EventKind::BackoffScheduled)
                    .with_source(route.source.as_str())
                    .with_attempt(attempt)
                    .with_delay(delay),
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = token.cancelled() => return Outcome::Stop,
            }
        }

        self.ctx.bus.publish(
            Event::new(EventKind::ListenerConnecting)
                .with_source(route.source.as_str())
                .with_attempt(attempt),
        );

        let mut frames = tokio::select! {
            connected = sse::subscribe(&self.ctx.stream, &route.source) => {
                match connected {
                    Ok(frames) => frames,
                    Err(err) => {
                        self.ctx.bus.publish(
                            Event::new(EventKind::SubscribeFailed)
                                .with_source(route.source.as_str())
                                .with_attempt(attempt)
                                .with_reason(render_chain(&err)),
                        );
                        return Outcome::Restart(attempt.saturating_add(1));
                    }
                }
            }
            _ = token.cancelled() => return Outcome::Stop,
        };

        // The subscription is established from here on: any later death
        // restarts from attempt 1, never the escalating counter.
        loop {
            let frame = tokio::select! {
                frame = frames.next_frame() => frame,
                _ = token.cancelled() => return Outcome::Stop,
            };
            match frame {
                Ok(Some(frame)) => self.handle_frame(frame, route).await,
                Ok(None) => {
                    self.ctx.bus.publish(
                        Event::new(EventKind::StreamClosed)
                            .with_source(route.source.as_str())
                            .with_reason(SubscriptionError::Closed.to_string()),
                    );
                    return Outcome::Restart(1);
                }
                Err(err) => {
                    self.ctx.bus.publish(
                        Event::new(EventKind::StreamClosed)
                            .with_source(route.source.as_str())
                            .with_reason(render_chain(&err)),
                    );
                    return Outcome::Restart(1);
                }
            }
        }
    }

    /// Dispatches one decoded frame.
    async fn handle_frame(&self, frame: Frame, route: &Route) {
        match frame.kind() {
            FrameKind::Ready => {
                self.ctx.bus.publish(
                    Event::new(EventKind::SubscriptionReady)
                        .with_source(route.source.as_str())
                        .with_target(route.target.as_str()),
                );
            }
            FrameKind::Ping => {}
            FrameKind::Data => self.forward(frame.data.as_bytes(), route).await,
        }
    }

    /// Transforms and delivers one data frame. Failures cost only this
    /// frame; the subscription stays up.
    async fn forward(&self, data: &[u8], route: &Route) {
        let request = match transform::descriptor_for(&route.target, data) {
            Ok(request) => request,
            Err(err) => {
                self.ctx.bus.publish(
                    Event::new(EventKind::PayloadRejected)
                        .with_source(route.source.as_str())
                        .with_reason(render_chain(&err)),
                );
                return;
            }
        };

        match self.ctx.delivery.deliver(&request).await {
            Ok(status) => {
                self.ctx.bus.publish(
                    Event::new(EventKind::Delivered)
                        .with_source(route.source.as_str())
                        .with_target(route.target.as_str())
                        .with_status(status.as_u16()),
                );
            }
            Err(err) => {
                self.ctx.bus.publish(
                    Event::new(EventKind::DeliveryFailed)
                        .with_source(route.source.as_str())
                        .with_target(route.target.as_str())
                        .with_reason(render_chain(&err)),
                );
            }
        }
    }
}

/// Renders a panic payload for the event log.
fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
