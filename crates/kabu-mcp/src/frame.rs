//! Newline-delimited JSON framing for the worker's stdout.

use serde_json::Value;

/// Splits a byte stream into parsed JSON frames, one per line.
///
/// Incomplete trailing data is held back until its newline arrives. Lines that
/// are not valid JSON are dropped: workers routinely print banners and log
/// output on stdout alongside protocol traffic.
#[derive(Debug, Default)]
pub struct FrameParser {
    buffer: Vec<u8>,
}

impl FrameParser {
    /// Create an empty parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every frame completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.buffer.extend_from_slice(chunk);

        let Some(last_newline) = self.buffer.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        complete
            .split(|&b| b == b'\n')
            .filter_map(parse_line)
            .collect()
    }

    /// Bytes held back waiting for a newline.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Whether no partial line is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

fn parse_line(line: &[u8]) -> Option<Value> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(line) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::debug!(
                error = %e,
                line = %String::from_utf8_lossy(line),
                "dropping non-JSON line from worker stdout"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_complete_line() {
        let mut parser = FrameParser::new();
        let frames = parser.feed(b"{\"id\":1,\"result\":{}}\n");
        assert_eq!(frames, vec![json!({"id": 1, "result": {}})]);
        assert!(parser.is_empty());
    }

    #[test]
    fn test_chunk_without_newline_only_buffers() {
        let mut parser = FrameParser::new();
        assert!(parser.feed(b"{\"id\":").is_empty());
        assert_eq!(parser.pending(), b"{\"id\":");
        assert!(parser.feed(b"2}").is_empty());

        let frames = parser.feed(b"\n");
        assert_eq!(frames, vec![json!({"id": 2})]);
        assert!(parser.is_empty());
    }

    #[test]
    fn test_multiple_lines_and_trailing_partial() {
        let mut parser = FrameParser::new();
        let frames = parser.feed(b"{\"a\":1}\n{\"b\":2}\n{\"c\":");
        assert_eq!(frames, vec![json!({"a": 1}), json!({"b": 2})]);
        assert_eq!(parser.pending(), b"{\"c\":");
    }

    #[test]
    fn test_noise_lines_are_dropped() {
        let mut parser = FrameParser::new();
        let frames = parser.feed(b"Starting stock server...\n{\"id\":1}\nWARNING: yfinance slow\n\n");
        assert_eq!(frames, vec![json!({"id": 1})]);
        assert!(parser.is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut parser = FrameParser::new();
        let frames = parser.feed(b"{\"id\":1}\r\n{\"id\":2}\r\n");
        assert_eq!(frames, vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[test]
    fn test_multibyte_utf8_split_across_chunks() {
        let line = "{\"name\":\"トヨタ自動車\"}\n".as_bytes();
        // Split inside the first multi-byte character.
        let split = line.iter().position(|&b| b >= 0x80).unwrap() + 1;

        let mut parser = FrameParser::new();
        assert!(parser.feed(&line[..split]).is_empty());
        let frames = parser.feed(&line[split..]);
        assert_eq!(frames, vec![json!({"name": "トヨタ自動車"})]);
    }

    #[test]
    fn test_every_split_point_matches_whole_parse() {
        let stream = b"banner\n{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n{\"id\":42,\"result\":{\"content\":[{\"text\":\"2500.5\"}]}}\n";
        let expected = FrameParser::new().feed(stream);
        assert_eq!(expected.len(), 2);

        for split in 0..=stream.len() {
            let mut parser = FrameParser::new();
            let mut frames = parser.feed(&stream[..split]);
            frames.extend(parser.feed(&stream[split..]));
            assert_eq!(frames, expected, "split at {split}");
        }
    }
}
