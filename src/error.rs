//! Error types used by the relay.
//!
//! Each enum corresponds to one recovery scope:
//!
//! - [`ConfigError`] — fatal at startup; the process exits.
//! - [`SubscriptionError`] — recovered by the listener restart loop.
//! - [`MalformedPayload`] — recovered per event; the frame is dropped.
//! - [`DeliveryError`] — recovered per event; logged, no retry.
//! - [`RuntimeError`] — raised by the supervisor's shutdown sequence.
//!
//! Nothing below the startup layer terminates the process.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// # Route configuration errors.
///
/// Produced while reading the route file or scanning the environment.
/// Always fatal: a relay without a valid route list has nothing to do.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The route file could not be read.
    #[error("reading route file {path:?}: {source}")]
    Read {
        /// Path passed via `--config`.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The route file is not a JSON array of `{Source, Target}` objects.
    #[error("parsing route file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A route environment variable is not `source,target`.
    #[error("environment variable {name} must hold \"source,target\" (comma-separated)")]
    EnvValue {
        /// Name of the offending variable.
        name: String,
    },

    /// A route has an empty source or target side.
    #[error("route from {origin} has an empty {field}")]
    EmptyField {
        /// Where the route came from (file index or variable name).
        origin: String,
        /// Which side is empty.
        field: &'static str,
    },

    /// Neither the file nor the environment produced any route.
    #[error("no routes configured (set --config or XAKAC_SOURCE_TARGET_* variables)")]
    NoRoutes,
}

/// # Subscription errors.
///
/// Failures to establish or maintain one stream connection. All variants
/// are recovered the same way: the listener terminates and its route is
/// re-enqueued for restart.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SubscriptionError {
    /// The subscribe request never produced a response.
    #[error("connect failed: {source}")]
    Connect {
        #[source]
        source: reqwest::Error,
    },

    /// The source answered with a non-success status.
    #[error("stream endpoint answered {status}")]
    Status { status: reqwest::StatusCode },

    /// The source answered with a body that is not an event stream.
    #[error("expected text/event-stream, got {found:?}")]
    ContentType { found: String },

    /// The established stream failed mid-flight.
    #[error("stream transport failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    /// The stream carried bytes that are not UTF-8.
    #[error("stream is not valid UTF-8: {source}")]
    Utf8 {
        #[source]
        source: std::str::Utf8Error,
    },

    /// The remote closed the stream cleanly.
    #[error("stream closed by remote")]
    Closed,
}

/// # Malformed payload.
///
/// A data frame whose payload does not decode as a top-level JSON object.
/// The frame is dropped; the subscription continues.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MalformedPayload {
    /// The payload is not valid JSON at all.
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is valid JSON but not an object at the top level.
    #[error("payload top level is not a JSON object")]
    NotObject,
}

/// # Delivery errors.
///
/// A POST that produced no HTTP response, or a descriptor whose header
/// material cannot be represented on the wire. The frame is dropped with a
/// log line; there is no retry and the subscription continues. An HTTP
/// response with *any* status is not an error.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// A payload key or value is not a legal HTTP header.
    #[error("header {name:?} from payload is not legal HTTP")]
    Header { name: String },

    /// Transport-level failure (DNS, refused connection, timeout).
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// # Errors produced by the relay runtime itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// An HTTP client could not be built at startup.
    #[error("building HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    /// Shutdown grace period was exceeded; remaining listeners were aborted.
    #[error("shutdown grace {grace:?} exceeded; {stuck} listener(s) aborted")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Number of listeners that did not stop in time.
        stuck: usize,
    },
}

/// Renders an error with its full source chain, `": "`-separated.
///
/// Used for the `reason` field of failure events so the log line carries
/// the root cause (e.g. a DNS failure hiding behind a generic client
/// error).
pub(crate) fn render_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(src) = cur {
        out.push_str(": ");
        out.push_str(&src.to_string());
        cur = src.source();
    }
    out
}
