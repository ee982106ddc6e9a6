use std::collections::VecDeque;

/// Circular buffer for line-based parsing of a chunked byte stream
///
/// Bytes are kept raw until a full line is available, so a multi-byte
/// character split across two reads is decoded only once it is whole.
pub struct CircularLineBuffer {
    buffer: VecDeque<u8>,
}

impl CircularLineBuffer {
    /// Create a new buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Add bytes to the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract next line (up to \n) from buffer
    ///
    /// Returns None if no complete line is available. A line that is not
    /// valid UTF-8 comes back as `Some(None)` so the caller can skip it.
    pub fn next_line(&mut self) -> Option<Option<String>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;

        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();

        Some(Self::decode(&line_bytes))
    }

    /// Drain whatever is left once the stream has ended
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest: Vec<u8> = self.buffer.drain(..).collect();
        Self::decode(&rest).filter(|line| !line.is_empty())
    }

    fn decode(bytes: &[u8]) -> Option<String> {
        std::str::from_utf8(bytes)
            .ok()
            .map(|line| line.trim_end_matches(['\n', '\r']).to_string())
    }

    /// Current buffer size
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_buffer_basic() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"line1\nline2\r\n");

        assert_eq!(buffer.next_line().unwrap().unwrap(), "line1");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "line2");
        assert!(buffer.next_line().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_partial_line() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"partial");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.len(), 7);

        buffer.extend(b" line\n");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "partial line");
    }

    #[test]
    fn test_multibyte_split_across_reads() {
        let mut buffer = CircularLineBuffer::with_capacity(64);
        let bytes = "café\n".as_bytes();

        // 'é' is two bytes; split between them
        buffer.extend(&bytes[..4]);
        assert!(buffer.next_line().is_none());
        buffer.extend(&bytes[4..]);
        assert_eq!(buffer.next_line().unwrap().unwrap(), "café");
    }

    #[test]
    fn test_invalid_utf8_line_is_reported() {
        let mut buffer = CircularLineBuffer::with_capacity(64);
        buffer.extend(&[0xff, 0xfe, b'\n', b'o', b'k', b'\n']);

        assert_eq!(buffer.next_line(), Some(None));
        assert_eq!(buffer.next_line(), Some(Some("ok".to_string())));
    }

    #[test]
    fn test_take_remainder() {
        let mut buffer = CircularLineBuffer::with_capacity(64);
        buffer.extend(b"data: tail");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.take_remainder(), Some("data: tail".to_string()));
        assert_eq!(buffer.take_remainder(), None);
    }
}
