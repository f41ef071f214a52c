//! Server-sent-event decoding for streaming completions.
//!
//! Wire format:
//! ```text
//! data: {"key": "value"}
//!
//! data: {"another": "event"}
//!
//! data: [DONE]
//! ```
//!
//! Network reads rarely align with event boundaries, so decoding is split
//! into a stateful [`FrameDecoder`] over raw bytes and a thin stream adapter
//! on `reqwest::Response`.

use bytes::BytesMut;
use futures::stream::{self, Stream, StreamExt};

use crate::error::{Error, Result};

const DONE_MARKER: &str = "[DONE]";

/// Stateful accumulator turning arbitrarily chunked bytes into the data
/// payloads of complete, blank-line-delimited SSE frames.
///
/// Bytes after the last complete frame stay buffered until the next feed;
/// the `[DONE]` sentinel ends the stream and is never yielded as data.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
    done: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one chunk of raw bytes from the transport.
    pub fn feed(&mut self, chunk: &[u8]) {
        if !self.done {
            self.buffer.extend_from_slice(chunk);
        }
    }

    /// True once the `[DONE]` sentinel has been decoded.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Extract the next complete frame's data payload, if one is buffered.
    ///
    /// Returns `Ok(None)` when no complete frame is available yet or the
    /// stream has ended; frames without `data:` lines (comments, `event:`,
    /// `id:` fields) are skipped.
    pub fn next_payload(&mut self) -> Result<Option<String>> {
        while !self.done {
            let Some((end, delimiter)) = find_frame_boundary(&self.buffer) else {
                return Ok(None);
            };
            let frame = self.buffer.split_to(end + delimiter);
            let text = std::str::from_utf8(&frame[..end])
                .map_err(|e| Error::Decode(format!("invalid UTF-8 in event stream: {e}")))?;

            let payload = text
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|value| value.strip_prefix(' ').unwrap_or(value))
                .collect::<Vec<_>>()
                .join("\n");

            if payload.is_empty() {
                continue;
            }
            if payload == DONE_MARKER {
                self.done = true;
                self.buffer.clear();
                return Ok(None);
            }
            return Ok(Some(payload));
        }
        Ok(None)
    }
}

/// Index of the next blank-line frame boundary and the delimiter width.
fn find_frame_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Extension trait for `reqwest::Response` to enable SSE streaming.
pub trait SseResponseExt {
    /// Decode the response body as an SSE stream of frame data payloads.
    ///
    /// Payloads are yielded in strict arrival order with no lookahead
    /// buffering; the stream ends at `[DONE]` without yielding it.
    fn sse_data(self) -> impl Stream<Item = Result<String>> + Send;
}

impl SseResponseExt for reqwest::Response {
    fn sse_data(self) -> impl Stream<Item = Result<String>> + Send {
        let byte_stream = self.bytes_stream();

        stream::unfold(
            (Box::pin(byte_stream), FrameDecoder::new(), false),
            |(mut source, mut decoder, mut exhausted)| async move {
                loop {
                    match decoder.next_payload() {
                        Ok(Some(payload)) => {
                            return Some((Ok(payload), (source, decoder, exhausted)))
                        }
                        Ok(None) => {}
                        Err(e) => return Some((Err(e), (source, decoder, exhausted))),
                    }

                    if decoder.is_done() || exhausted {
                        return None;
                    }

                    match source.next().await {
                        Some(Ok(chunk)) => decoder.feed(&chunk),
                        Some(Err(e)) => {
                            return Some((
                                Err(Error::from_transport(e)),
                                (source, decoder, exhausted),
                            ))
                        }
                        None => exhausted = true,
                    }
                }
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(decoder: &mut FrameDecoder) -> Vec<String> {
        let mut payloads = Vec::new();
        while let Some(payload) = decoder.next_payload().unwrap() {
            payloads.push(payload);
        }
        payloads
    }

    #[test]
    fn frame_split_across_reads_is_reassembled() {
        let mut decoder = FrameDecoder::new();

        decoder.feed(b"data: {\"content\":");
        assert_eq!(decoder.next_payload().unwrap(), None);

        decoder.feed(b" \"hi\"}\n\n");
        assert_eq!(drain(&mut decoder), vec!["{\"content\": \"hi\"}"]);
    }

    #[test]
    fn multiple_frames_in_one_read() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"data: one\n\ndata: two\n\ndata: thr");
        assert_eq!(drain(&mut decoder), vec!["one", "two"]);

        decoder.feed(b"ee\n\n");
        assert_eq!(drain(&mut decoder), vec!["three"]);
    }

    #[test]
    fn done_marker_ends_the_stream_without_being_emitted() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"data: one\n\ndata: [DONE]\n\ndata: after\n\n");
        assert_eq!(drain(&mut decoder), vec!["one"]);
        assert!(decoder.is_done());

        // Nothing after the sentinel is decoded, even with fresh input.
        decoder.feed(b"data: more\n\n");
        assert_eq!(decoder.next_payload().unwrap(), None);
    }

    #[test]
    fn crlf_frames_are_handled() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"data: one\r\n\r\ndata: two\r\n\r\n");
        assert_eq!(drain(&mut decoder), vec!["one", "two"]);
    }

    #[test]
    fn non_data_fields_are_skipped() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b": keep-alive\n\nevent: ping\nid: 7\n\ndata: payload\n\n");
        assert_eq!(drain(&mut decoder), vec!["payload"]);
    }

    #[test]
    fn multi_line_data_is_joined() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"data: first\ndata: second\n\n");
        assert_eq!(drain(&mut decoder), vec!["first\nsecond"]);
    }

    #[test]
    fn trailing_partial_frame_stays_buffered() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"data: whole\n\ndata: partial");
        assert_eq!(drain(&mut decoder), vec!["whole"]);
        assert!(!decoder.is_done());

        decoder.feed(b"\n\n");
        assert_eq!(drain(&mut decoder), vec!["partial"]);
    }
}
