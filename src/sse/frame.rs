//! Decoded SSE frames and their control/data classification.

/// Event type a source uses to announce the stream is live.
pub const READY_EVENT: &str = "ready";

/// Event type for keep-alive frames.
pub const PING_EVENT: &str = "ping";

/// One decoded frame from an event stream.
///
/// `event` is the raw event type as sent by the source; empty when the
/// frame carried no `event:` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub event: String,
    pub data: String,
}

/// How a frame is handled by the listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// Subscription confirmed by the source. Logged, never forwarded.
    Ready,
    /// Keep-alive. Silently discarded.
    Ping,
    /// Payload to transform and deliver. Covers the default (empty) event
    /// type and every named type that is not a control frame.
    Data,
}

impl Frame {
    #[must_use]
    pub fn kind(&self) -> FrameKind {
        match self.event.as_str() {
            READY_EVENT => FrameKind::Ready,
            PING_EVENT => FrameKind::Ping,
            _ => FrameKind::Data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(event: &str, data: &str) -> Frame {
        Frame {
            event: event.to_owned(),
            data: data.to_owned(),
        }
    }

    #[test]
    fn test_ready_and_ping_are_control_frames() {
        assert_eq!(frame("ready", "").kind(), FrameKind::Ready);
        assert_eq!(frame("ping", "").kind(), FrameKind::Ping);
    }

    #[test]
    fn test_control_frames_ignore_their_payload() {
        assert_eq!(frame("ready", r#"{"body":"x"}"#).kind(), FrameKind::Ready);
        assert_eq!(frame("ping", r#"{"body":"x"}"#).kind(), FrameKind::Ping);
    }

    #[test]
    fn test_default_event_type_is_data() {
        assert_eq!(frame("", "{}").kind(), FrameKind::Data);
    }

    #[test]
    fn test_named_event_types_are_data() {
        assert_eq!(frame("message", "{}").kind(), FrameKind::Data);
        assert_eq!(frame("order-created", "{}").kind(), FrameKind::Data);
    }

    #[test]
    fn test_classification_is_case_sensitive() {
        assert_eq!(frame("Ready", "").kind(), FrameKind::Data);
        assert_eq!(frame("PING", "").kind(), FrameKind::Data);
    }
}
