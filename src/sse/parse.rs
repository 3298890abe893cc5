//! Incremental parser turning raw byte chunks into SSE frames.
//!
//! Implements the event-stream wire format: LF, CR and CRLF line endings,
//! an optional leading UTF-8 BOM, `:` comment lines, `field: value` lines
//! with a single optional space after the colon, multiple `data:` lines
//! joined with `\n`, and frame dispatch at the blank line. `id:` and
//! `retry:` fields are consumed and ignored; this relay never resumes a
//! stream by event id.
//!
//! One deviation from the HTML event-stream algorithm: a frame carrying an
//! event type but no `data:` line is still dispatched (with empty data).
//! Sources announce readiness as a bare `event: ready` frame and that
//! signal must not be swallowed.

use bytes::{Buf, BytesMut};

use super::frame::Frame;

const CR: u8 = b'\r';
const LF: u8 = b'\n';
const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// One complete line from the stream.
enum Line {
    /// Comment line (starts with `:`).
    Comment,
    /// Blank line: frame delimiter.
    Empty,
    /// `name[: value]` field line.
    Field { name: BytesMut, value: Option<BytesMut> },
}

/// Stateful frame assembler fed by transport chunks.
///
/// Call [`feed`](Self::feed) with each chunk, then drain completed frames
/// with [`poll_frame`](Self::poll_frame). When the transport ends, call
/// [`finish`](Self::finish) once and poll again for a final frame.
#[derive(Default)]
pub struct FrameParser {
    buffer: BytesMut,
    event: String,
    data: String,
    has_data: bool,
    started: bool,
    ended: bool,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transport chunk to the internal buffer.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Marks the end of the transport stream.
    ///
    /// A trailing lone CR can now be resolved: no LF will ever follow, so
    /// one is appended to let the final line parse.
    pub fn finish(&mut self) {
        self.ended = true;
        if self.buffer.last() == Some(&CR) {
            self.buffer.extend_from_slice(&[LF]);
        }
    }

    /// Extracts the next completed frame from the buffered input.
    ///
    /// Returns `Ok(None)` when more input is needed. Non-UTF-8 field
    /// content is a decode failure that terminates the subscription.
    pub fn poll_frame(&mut self) -> Result<Option<Frame>, std::str::Utf8Error> {
        if !self.started && !self.skip_bom() {
            return Ok(None);
        }
        while let Some(line) = self.next_line() {
            if let Some(frame) = self.accept(line)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    /// Resolves the BOM state once enough bytes are buffered. Returns
    /// whether line parsing may proceed.
    fn skip_bom(&mut self) -> bool {
        let n = self.buffer.len().min(BOM.len());
        if self.buffer[..n] == BOM[..n] {
            if n == BOM.len() {
                self.buffer.advance(BOM.len());
            } else if !self.ended {
                // Could still be a partial BOM; wait for more bytes.
                return false;
            }
        }
        self.started = true;
        true
    }

    /// Splits the next terminated line off the buffer.
    ///
    /// A lone CR at the buffer end is kept back until the next chunk shows
    /// whether it heads a CRLF pair.
    fn next_line(&mut self) -> Option<Line> {
        let (line_end, rest_start) = find_eol(&self.buffer)?;
        let line = self.buffer.split_to(line_end);
        self.buffer.advance(rest_start - line_end);

        if line.is_empty() {
            return Some(Line::Empty);
        }
        match memchr::memchr(b':', &line) {
            Some(0) => Some(Line::Comment),
            Some(colon) => {
                let mut line = line;
                let mut value = line.split_off(colon);
                value.advance(1);
                if value.first() == Some(&b' ') {
                    value.advance(1);
                }
                Some(Line::Field {
                    name: line,
                    value: Some(value),
                })
            }
            None => Some(Line::Field {
                name: line,
                value: None,
            }),
        }
    }

    /// Feeds one line into the frame under construction; returns the frame
    /// when the line completes one.
    fn accept(&mut self, line: Line) -> Result<Option<Frame>, std::str::Utf8Error> {
        match line {
            Line::Empty => Ok(self.dispatch()),
            Line::Comment => Ok(None),
            Line::Field { name, value } => {
                match name.as_ref() {
                    b"event" => {
                        if let Some(value) = value {
                            self.event = std::str::from_utf8(&value)?.to_owned();
                        }
                    }
                    b"data" => {
                        if self.has_data {
                            self.data.push('\n');
                        }
                        if let Some(value) = value {
                            self.data.push_str(std::str::from_utf8(&value)?);
                        }
                        self.has_data = true;
                    }
                    // id, retry and unknown fields are ignored.
                    _ => {}
                }
                Ok(None)
            }
        }
    }

    fn dispatch(&mut self) -> Option<Frame> {
        let complete = self.has_data || !self.event.is_empty();
        let frame = Frame {
            event: std::mem::take(&mut self.event),
            data: std::mem::take(&mut self.data),
        };
        self.has_data = false;
        complete.then_some(frame)
    }
}

/// Finds the next end-of-line.
///
/// Returns `(line_end, rest_start)` — the non-inclusive end of the line
/// and the inclusive start of the remainder. Returns `None` when more
/// data is needed, including for a buffer ending in a lone CR that could
/// yet become a CRLF pair.
fn find_eol(bytes: &[u8]) -> Option<(usize, usize)> {
    let hit = memchr::memchr2(CR, LF, bytes)?;
    match bytes[hit] {
        LF => Some((hit, hit + 1)),
        CR => {
            if hit + 1 >= bytes.len() {
                return None;
            }
            if bytes[hit + 1] == LF {
                Some((hit, hit + 2))
            } else {
                Some((hit, hit + 1))
            }
        }
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &[u8]) -> Vec<Frame> {
        let mut parser = FrameParser::new();
        parser.feed(input);
        parser.finish();
        let mut frames = Vec::new();
        while let Some(frame) = parser.poll_frame().unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_single_data_frame() {
        let frames = collect(b"data: {\"n\":1}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "");
        assert_eq!(frames[0].data, "{\"n\":1}");
    }

    #[test]
    fn test_event_type_and_data() {
        let frames = collect(b"event: update\ndata: hello\nid: 7\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "update");
        assert_eq!(frames[0].data, "hello");
    }

    #[test]
    fn test_bare_event_type_dispatches() {
        let frames = collect(b"event: ready\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "ready");
        assert_eq!(frames[0].data, "");
    }

    #[test]
    fn test_multiple_data_lines_join_with_newline() {
        let frames = collect(b"data: first\ndata: second\n\n");
        assert_eq!(frames[0].data, "first\nsecond");
    }

    #[test]
    fn test_crlf_and_cr_line_endings() {
        let frames = collect(b"data: a\r\n\r\ndata: b\r\rdata: c\n\n");
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].data, "a");
        assert_eq!(frames[1].data, "b");
        assert_eq!(frames[2].data, "c");
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut parser = FrameParser::new();
        parser.feed(b"data: a\r");
        assert!(parser.poll_frame().unwrap().is_none());
        parser.feed(b"\n\r\n");
        let frame = parser.poll_frame().unwrap().unwrap();
        assert_eq!(frame.data, "a");
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut input = vec![0xEF, 0xBB, 0xBF];
        input.extend_from_slice(b"data: x\n\n");
        let frames = collect(&input);
        assert_eq!(frames[0].data, "x");
    }

    #[test]
    fn test_partial_bom_waits_for_more_bytes() {
        let mut parser = FrameParser::new();
        parser.feed(&[0xEF, 0xBB]);
        assert!(parser.poll_frame().unwrap().is_none());
        parser.feed(&[0xBF]);
        parser.feed(b"data: x\n\n");
        let frame = parser.poll_frame().unwrap().unwrap();
        assert_eq!(frame.data, "x");
    }

    #[test]
    fn test_comment_lines_are_ignored() {
        let frames = collect(b": keep-alive\ndata: x\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "x");
    }

    #[test]
    fn test_no_space_after_colon() {
        let frames = collect(b"data:tight\n\n");
        assert_eq!(frames[0].data, "tight");
    }

    #[test]
    fn test_only_first_space_stripped() {
        let frames = collect(b"data:  two spaces\n\n");
        assert_eq!(frames[0].data, " two spaces");
    }

    #[test]
    fn test_blank_lines_alone_dispatch_nothing() {
        let frames = collect(b"\n\n\n");
        assert!(frames.is_empty());
    }

    #[test]
    fn test_data_without_terminating_blank_line_is_dropped() {
        let frames = collect(b"data: incomplete\n");
        assert!(frames.is_empty());
    }

    #[test]
    fn test_field_without_colon_sets_no_value() {
        // "data" alone counts as a data line with empty value.
        let frames = collect(b"data\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "");
    }

    #[test]
    fn test_trailing_cr_resolved_at_finish() {
        let mut parser = FrameParser::new();
        parser.feed(b"data: x\n\r");
        parser.finish();
        let frame = parser.poll_frame().unwrap().unwrap();
        assert_eq!(frame.data, "x");
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let mut parser = FrameParser::new();
        parser.feed(b"data: \xff\xfe\n\n");
        assert!(parser.poll_frame().is_err());
    }

    #[test]
    fn test_id_and_retry_are_ignored() {
        let frames = collect(b"id: 42\nretry: 1000\ndata: x\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "x");
    }
}
