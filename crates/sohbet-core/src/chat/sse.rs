//! SSE (Server-Sent Events) stream decoding
//!
//! Turns the raw byte stream of a chat response into discrete events. The
//! backend frames events as newline-delimited `data: <json>` lines where
//! `<json>` is `{ "textResponse"?: string, "error"?: string }`.

use serde_json::Value;

/// A decoded stream event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental reply text
    TextDelta(String),
    /// The line was malformed, or its payload carried an `error` field
    Error(String),
}

/// Incremental SSE decoder with carry-over buffering
///
/// Network chunks split lines at arbitrary byte offsets, including inside
/// the `data: ` token and inside multi-byte UTF-8 sequences. Unterminated
/// trailing bytes are carried between [`feed`](Self::feed) calls and only
/// decoded once their newline arrives, so the emitted events do not depend
/// on how the transport chunked the bytes.
pub struct StreamDecoder {
    /// Bytes of the trailing not-yet-terminated line
    carry: Vec<u8>,
    /// Decoded event counter for logging
    events_decoded: usize,
    /// Bytes received counter
    bytes_fed: usize,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self {
            carry: Vec::new(),
            events_decoded: 0,
            bytes_fed: 0,
        }
    }

    /// Decode a chunk, returning every event completed by it
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.bytes_fed += chunk.len();
        self.carry.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.carry.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.carry.drain(..=newline).collect();
            let text = String::from_utf8_lossy(&raw);
            let line = text.trim();

            // Blank separators and SSE keep-alive comments
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            if let Some(data) = line.strip_prefix("data: ") {
                events.push(self.decode_data(data.trim()));
            }
        }
        events
    }

    /// Log totals; unterminated carry-over bytes are discarded at end-of-stream
    pub fn finish(&self) {
        tracing::info!(
            events = self.events_decoded,
            bytes = self.bytes_fed,
            discarded = self.carry.len(),
            "Stream decode finished"
        );
    }

    fn decode_data(&mut self, data: &str) -> StreamEvent {
        self.events_decoded += 1;

        match serde_json::from_str::<Value>(data) {
            Ok(json) => {
                if let Some(error) = upstream_error(&json) {
                    tracing::warn!(event = self.events_decoded, error = %error, "Stream event carried an error");
                    return StreamEvent::Error(error);
                }

                let delta = json
                    .get("textResponse")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                tracing::debug!(event = self.events_decoded, chars = delta.len(), "Stream text delta");
                StreamEvent::TextDelta(delta)
            }
            Err(e) => {
                tracing::warn!(event = self.events_decoded, line = %data, error = %e, "Failed to parse stream event");
                StreamEvent::Error(e.to_string())
            }
        }
    }
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract a reportable `error` field
///
/// The wire contract says string; any other non-null value is still
/// reported with its JSON rendering. An empty string does not count, and
/// the event falls through to its `textResponse`.
fn upstream_error(json: &Value) -> Option<String> {
    match json.get("error")? {
        Value::Null => None,
        Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deltas(events: &[StreamEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::TextDelta(d) => Some(d.as_str()),
                StreamEvent::Error(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_single_chunk_yields_delta() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.feed(b"data: {\"textResponse\":\"Merhaba\"}\n");
        assert_eq!(
            events,
            vec![StreamEvent::TextDelta("Merhaba".to_string())]
        );
    }

    #[test]
    fn test_two_events_in_one_chunk() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.feed(
            b"data: {\"textResponse\":\"Hi\"}\ndata: {\"textResponse\":\" there\"}\n",
        );
        assert_eq!(events.len(), 2);
        assert_eq!(deltas(&events), "Hi there");
    }

    #[test]
    fn test_chunk_boundary_invariance_at_every_offset() {
        let frame = b"data: {\"textResponse\":\"ab\"}\n";

        let mut whole = StreamDecoder::new();
        let expected = whole.feed(frame);
        assert_eq!(expected, vec![StreamEvent::TextDelta("ab".to_string())]);

        for split in 0..=frame.len() {
            let mut decoder = StreamDecoder::new();
            let mut events = decoder.feed(&frame[..split]);
            events.extend(decoder.feed(&frame[split..]));
            assert_eq!(events, expected, "split at byte {}", split);
        }
    }

    #[test]
    fn test_split_inside_multibyte_character() {
        // "Günaydın" has multi-byte characters; splitting inside one must
        // not corrupt the decoded text.
        let frame = "data: {\"textResponse\":\"Günaydın\"}\n".as_bytes();

        let mut whole = StreamDecoder::new();
        let expected = whole.feed(frame);
        assert_eq!(deltas(&expected), "Günaydın");

        for split in 0..=frame.len() {
            let mut decoder = StreamDecoder::new();
            let mut events = decoder.feed(&frame[..split]);
            events.extend(decoder.feed(&frame[split..]));
            assert_eq!(events, expected, "split at byte {}", split);
        }
    }

    #[test]
    fn test_carry_over_across_many_feeds() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.feed(b"da").is_empty());
        assert!(decoder.feed(b"ta: {\"textRes").is_empty());
        assert!(decoder.feed(b"ponse\":\"par\xc3").is_empty());
        let events = decoder.feed(b"\xa7a\"}\n");
        assert_eq!(events, vec![StreamEvent::TextDelta("parça".to_string())]);
    }

    #[test]
    fn test_malformed_line_does_not_stop_decoding() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.feed(b"data: not-json\ndata: {\"textResponse\":\"ok\"}\n");

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], StreamEvent::Error(_)));
        assert_eq!(events[1], StreamEvent::TextDelta("ok".to_string()));
    }

    #[test]
    fn test_malformed_line_in_earlier_chunk() {
        let mut decoder = StreamDecoder::new();
        let first = decoder.feed(b"data: {broken\n");
        assert!(matches!(first[0], StreamEvent::Error(_)));

        let second = decoder.feed(b"data: {\"textResponse\":\"sonra\"}\n");
        assert_eq!(second, vec![StreamEvent::TextDelta("sonra".to_string())]);
    }

    #[test]
    fn test_error_field_yields_error_event() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.feed(b"data: {\"error\":\"kota doldu\"}\n");
        assert_eq!(events, vec![StreamEvent::Error("kota doldu".to_string())]);
    }

    #[test]
    fn test_empty_error_field_falls_through_to_text() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.feed(b"data: {\"error\":\"\",\"textResponse\":\"devam\"}\n");
        assert_eq!(events, vec![StreamEvent::TextDelta("devam".to_string())]);
    }

    #[test]
    fn test_missing_text_response_defaults_to_empty() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.feed(b"data: {}\n");
        assert_eq!(events, vec![StreamEvent::TextDelta(String::new())]);
    }

    #[test]
    fn test_ignores_non_data_lines() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.feed(b"event: ping\n: keep-alive\n\ndata: {\"textResponse\":\"x\"}\n");
        assert_eq!(events, vec![StreamEvent::TextDelta("x".to_string())]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.feed(b"data: {\"textResponse\":\"sat\\u0131r\"}\r\n");
        assert_eq!(events, vec![StreamEvent::TextDelta("satır".to_string())]);
    }

    #[test]
    fn test_unterminated_tail_is_never_emitted() {
        let mut decoder = StreamDecoder::new();
        let events = decoder.feed(b"data: {\"textResponse\":\"yarim\"}");
        assert!(events.is_empty());
        decoder.finish();
    }
}
