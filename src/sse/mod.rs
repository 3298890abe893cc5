//! SSE subscription transport.
//!
//! [`subscribe`] opens the long-lived GET against a source and validates
//! the response; [`FrameStream`] pulls decoded [`Frame`]s out of the byte
//! stream until the remote closes or the transport fails.
//!
//! ```text
//!   GET source  ──►  status / content-type checks  ──►  FrameStream
//!                                                         │ next_frame()
//!                                                         ▼
//!                                                       Frame
//! ```

mod frame;
mod parse;

pub use frame::{Frame, FrameKind, PING_EVENT, READY_EVENT};
pub use parse::FrameParser;

use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};

use crate::error::SubscriptionError;

/// MIME type an event stream response must carry.
pub const EVENT_STREAM_MIME: &str = "text/event-stream";

/// Byte stream of one subscription response.
pub type SourceStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// Opens a subscription to `url` and returns the decoded frame stream.
///
/// Fails when the request itself fails, the source answers with a
/// non-success status, or the response is not an event stream.
pub async fn subscribe(
    client: &reqwest::Client,
    url: &str,
) -> Result<FrameStream<SourceStream>, SubscriptionError> {
    let response = client
        .get(url)
        .header(ACCEPT, EVENT_STREAM_MIME)
        .header(CACHE_CONTROL, "no-cache")
        .send()
        .await
        .map_err(|source| SubscriptionError::Connect { source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(SubscriptionError::Status { status });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.contains(EVENT_STREAM_MIME) {
        return Err(SubscriptionError::ContentType {
            found: content_type.to_owned(),
        });
    }

    Ok(FrameStream::new(Box::pin(response.bytes_stream())))
}

/// Decoded frame stream over a subscription's byte stream.
pub struct FrameStream<S> {
    inner: S,
    parser: FrameParser,
    ended: bool,
}

impl<S> FrameStream<S>
where
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin,
{
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            parser: FrameParser::new(),
            ended: false,
        }
    }

    /// Returns the next frame.
    ///
    /// `Ok(None)` means the remote closed the stream cleanly; any error
    /// ends the subscription. Bytes buffered without a terminating blank
    /// line when the stream closes never form a frame.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>, SubscriptionError> {
        loop {
            if let Some(frame) = self
                .parser
                .poll_frame()
                .map_err(|source| SubscriptionError::Utf8 { source })?
            {
                return Ok(Some(frame));
            }
            if self.ended {
                return Ok(None);
            }
            match self.inner.next().await {
                Some(Ok(chunk)) => self.parser.feed(&chunk),
                Some(Err(source)) => {
                    self.ended = true;
                    return Err(SubscriptionError::Transport { source });
                }
                None => {
                    self.ended = true;
                    self.parser.finish();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunked(parts: &[&[u8]]) -> FrameStream<SourceStream> {
        let items: Vec<reqwest::Result<Bytes>> = parts
            .iter()
            .map(|p| Ok(Bytes::copy_from_slice(p)))
            .collect();
        FrameStream::new(Box::pin(stream::iter(items)))
    }

    #[tokio::test]
    async fn test_frames_across_chunk_boundaries() {
        let mut frames = chunked(&[b"event: re", b"ady\n\ndata: {\"a\"", b":1}\n\n"]);

        let ready = frames.next_frame().await.unwrap().unwrap();
        assert_eq!(ready.kind(), FrameKind::Ready);

        let data = frames.next_frame().await.unwrap().unwrap();
        assert_eq!(data.kind(), FrameKind::Data);
        assert_eq!(data.data, "{\"a\":1}");

        assert!(frames.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clean_close_yields_none_after_last_frame() {
        let mut frames = chunked(&[b"data: x\n\n"]);
        assert!(frames.next_frame().await.unwrap().is_some());
        assert!(frames.next_frame().await.unwrap().is_none());
        // Repeated polls after the end stay at None.
        assert!(frames.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unterminated_tail_is_dropped_on_close() {
        let mut frames = chunked(&[b"data: complete\n\n", b"data: partial"]);
        let frame = frames.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.data, "complete");
        assert!(frames.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_utf8_fails_the_stream() {
        let mut frames = chunked(&[b"data: \xff\n\n"]);
        let err = frames.next_frame().await.unwrap_err();
        assert!(matches!(err, SubscriptionError::Utf8 { .. }));
    }
}
