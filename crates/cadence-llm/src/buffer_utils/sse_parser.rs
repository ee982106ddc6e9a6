use futures::{Stream, StreamExt};
use std::fmt::Display;

use super::buffering::CircularLineBuffer;
use crate::streaming::{EventStream, StreamEvent};

/// Strategy pattern for parsing different provider wire formats
///
/// Parsers may keep state across lines (e.g. block index → tool id).
pub trait SseLineParser: Send {
    /// Parse one `data:` payload; `None` means the line carries no event
    fn parse_data_line(&mut self, event_name: Option<&str>, data: &str) -> Option<StreamEvent>;

    /// Check if this payload is the end-of-stream sentinel
    fn is_done_marker(&self, data: &str) -> bool {
        data == "[DONE]"
    }
}

/// Incremental decoder for one text event-stream
///
/// Feeds raw chunks into a line buffer and yields one event per complete
/// `data:` line. Malformed input never aborts decoding.
pub struct SseDecoder<P> {
    buffer: CircularLineBuffer,
    parser: P,
    event_name: Option<String>,
}

impl<P: SseLineParser> SseDecoder<P> {
    pub fn new(parser: P) -> Self {
        Self {
            buffer: CircularLineBuffer::with_capacity(4096),
            parser,
            event_name: None,
        }
    }

    /// Push a chunk and return every event completed by it
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend(bytes);

        let mut events = Vec::new();
        while let Some(line) = self.buffer.next_line() {
            match line {
                Some(line) => {
                    if let Some(event) = self.handle_line(&line) {
                        events.push(event);
                    }
                }
                None => tracing::debug!("Skipping non UTF-8 SSE line"),
            }
        }
        events
    }

    /// Flush a trailing line that arrived without a newline
    pub fn finish(&mut self) -> Option<StreamEvent> {
        let line = self.buffer.take_remainder()?;
        self.handle_line(&line)
    }

    fn handle_line(&mut self, line: &str) -> Option<StreamEvent> {
        if line.is_empty() {
            // Blank line terminates an SSE event
            self.event_name = None;
            return None;
        }
        if line.starts_with(':') {
            return None;
        }
        if let Some(name) = line.strip_prefix("event:") {
            self.event_name = Some(name.trim().to_string());
            return None;
        }

        let data = line.strip_prefix("data:")?.trim_start();
        if self.parser.is_done_marker(data) {
            return None;
        }
        self.parser.parse_data_line(self.event_name.as_deref(), data)
    }
}

/// Generic SSE stream parser over any chunked byte source
///
/// Transport errors are surfaced as `Err` items; everything else that cannot
/// be understood is dropped.
pub fn parse_sse_stream<S, B, E, P>(byte_stream: S, parser: P) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
    P: SseLineParser + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(byte_stream);
        let mut decoder = SseDecoder::new(parser);

        while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    for event in decoder.feed(bytes.as_ref()) {
                        yield Ok(event);
                    }
                }
                Err(e) => {
                    yield Err(anyhow::anyhow!("Stream error: {}", e));
                    return;
                }
            }
        }

        if let Some(event) = decoder.finish() {
            yield Ok(event);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Echoes the payload back as a token, for exercising framing only
    struct EchoParser;

    impl SseLineParser for EchoParser {
        fn parse_data_line(&mut self, _event_name: Option<&str>, data: &str) -> Option<StreamEvent> {
            Some(StreamEvent::token(data))
        }
    }

    #[test]
    fn test_data_lines_become_events() {
        let mut decoder = SseDecoder::new(EchoParser);
        let events = decoder.feed(b"event: x\ndata: one\n\ndata: two\n\n");
        assert_eq!(events, vec![StreamEvent::token("one"), StreamEvent::token("two")]);
    }

    #[test]
    fn test_done_marker_and_comments_are_ignored() {
        let mut decoder = SseDecoder::new(EchoParser);
        let events = decoder.feed(b": keep-alive\ndata: [DONE]\nretry: 10\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_split_payload_across_many_reads() {
        let mut decoder = SseDecoder::new(EchoParser);
        let mut events = Vec::new();
        for byte in b"data: hello world\n" {
            events.extend(decoder.feed(&[*byte]));
        }
        assert_eq!(events, vec![StreamEvent::token("hello world")]);
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = SseDecoder::new(EchoParser);
        assert!(decoder.feed(b"data: tail").is_empty());
        assert_eq!(decoder.finish(), Some(StreamEvent::token("tail")));
    }
}
