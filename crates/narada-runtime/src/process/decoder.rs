//! Newline-delimited JSON decoding of collaborator output.
//!
//! Chunk boundaries never line up with line boundaries in general, so
//! [`LineBuffer`] carries an incomplete trailing line over to the next chunk.
//! Bytes are decoded lossily: collaborators may print invalid UTF-8, and one
//! bad byte must not end the stream.

use narada_core::{ProcessKind, Severity, StatusEvent};
use serde::Deserialize;

/// Stateful splitter turning byte chunks into complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every line it completes, without the
    /// terminator. A trailing partial line stays buffered.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            lines.push(decode(&self.pending[start..end]));
            start = end + 1;
        }
        self.pending.drain(..start);
        lines
    }

    /// Flush the buffered partial line at end of stream.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = decode(&self.pending);
        self.pending.clear();
        Some(line)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Structured stdout record, discriminated by `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireMessage {
    Status {
        running: bool,
        #[serde(default)]
        message: String,
        #[serde(default)]
        error: bool,
    },
    Stats {
        #[serde(default)]
        count: f64,
        #[serde(default)]
        fps: f64,
        #[serde(default)]
        mode: String,
    },
    Error {
        #[serde(default)]
        message: String,
    },
    Log {
        #[serde(default)]
        message: String,
    },
}

impl WireMessage {
    fn into_event(self, kind: ProcessKind) -> StatusEvent {
        match self {
            Self::Status {
                running,
                message,
                error,
            } => StatusEvent::ServiceStatus {
                kind,
                running,
                message,
                error,
                pid: None,
            },
            Self::Stats { count, fps, mode } => StatusEvent::ServiceStats {
                kind,
                count,
                fps,
                mode,
            },
            Self::Error { message } => StatusEvent::log(kind, Severity::Error, message),
            Self::Log { message } => StatusEvent::log(kind, Severity::Info, message),
        }
    }
}

/// Map one stdout line to an event. Blank lines yield nothing; anything that
/// is not a recognised record becomes an `info` log line.
pub fn decode_line(kind: ProcessKind, line: &str) -> Option<StatusEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let event = serde_json::from_str::<WireMessage>(trimmed).map_or_else(
        |_| StatusEvent::log(kind, Severity::Info, trimmed),
        |msg| msg.into_event(kind),
    );
    Some(event)
}

/// Map one stderr line to an `error` log line. No structured decoding.
pub fn decode_stderr_line(kind: ProcessKind, line: &str) -> Option<StatusEvent> {
    let trimmed = line.trim();
    (!trimmed.is_empty()).then(|| StatusEvent::log(kind, Severity::Error, trimmed))
}

/// Which stream a decoder is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Stdout,
    Stderr,
}

impl Channel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// Restartable decoder for one output stream of one process.
#[derive(Debug)]
pub struct LineProtocolDecoder {
    kind: ProcessKind,
    channel: Channel,
    buffer: LineBuffer,
}

impl LineProtocolDecoder {
    pub fn stdout(kind: ProcessKind) -> Self {
        Self::new(kind, Channel::Stdout)
    }

    pub fn stderr(kind: ProcessKind) -> Self {
        Self::new(kind, Channel::Stderr)
    }

    fn new(kind: ProcessKind, channel: Channel) -> Self {
        Self {
            kind,
            channel,
            buffer: LineBuffer::new(),
        }
    }

    pub const fn channel(&self) -> Channel {
        self.channel
    }

    /// Feed a chunk and collect the events for every line it completes,
    /// in emission order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StatusEvent> {
        self.buffer
            .push(chunk)
            .iter()
            .filter_map(|line| self.decode(line))
            .collect()
    }

    /// Decode whatever partial line remains at end of stream.
    pub fn finish(&mut self) -> Option<StatusEvent> {
        self.buffer.finish().and_then(|line| self.decode(&line))
    }

    fn decode(&self, line: &str) -> Option<StatusEvent> {
        match self.channel {
            Channel::Stdout => decode_line(self.kind, line),
            Channel::Stderr => decode_stderr_line(self.kind, line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_then_raw_line_in_order() {
        let mut decoder = LineProtocolDecoder::stdout(ProcessKind::Analyzer);
        let events = decoder.feed(
            b"{\"type\":\"stats\",\"count\":5,\"fps\":12,\"mode\":\"det\"}\n{not json}\n",
        );

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            StatusEvent::ServiceStats {
                kind: ProcessKind::Analyzer,
                count: 5.0,
                fps: 12.0,
                mode: "det".to_string(),
            }
        );
        assert_eq!(
            events[1],
            StatusEvent::log(ProcessKind::Analyzer, Severity::Info, "{not json}")
        );
    }

    #[test]
    fn record_split_across_chunks_is_reassembled() {
        let mut decoder = LineProtocolDecoder::stdout(ProcessKind::Analyzer);
        assert!(decoder.feed(b"{\"type\":\"status\",\"runn").is_empty());
        let events = decoder.feed(b"ing\":true,\"message\":\"Connected\"}\r\n");

        assert_eq!(
            events,
            vec![StatusEvent::ServiceStatus {
                kind: ProcessKind::Analyzer,
                running: true,
                message: "Connected".to_string(),
                error: false,
                pid: None,
            }]
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut decoder = LineProtocolDecoder::stdout(ProcessKind::Relay);
        assert!(decoder.feed(b"\n   \n\r\n").is_empty());
    }

    #[test]
    fn error_and_log_records_map_to_severities() {
        let mut decoder = LineProtocolDecoder::stdout(ProcessKind::Analyzer);
        let events = decoder.feed(
            b"{\"type\":\"error\",\"message\":\"no feed\"}\n{\"type\":\"log\",\"message\":\"warming up\"}\n",
        );
        assert_eq!(
            events,
            vec![
                StatusEvent::log(ProcessKind::Analyzer, Severity::Error, "no feed"),
                StatusEvent::log(ProcessKind::Analyzer, Severity::Info, "warming up"),
            ]
        );
    }

    #[test]
    fn unknown_type_falls_back_to_raw_log() {
        let line = r#"{"type":"heartbeat"}"#;
        assert_eq!(
            decode_line(ProcessKind::Analyzer, line),
            Some(StatusEvent::log(ProcessKind::Analyzer, Severity::Info, line))
        );
    }

    #[test]
    fn stderr_is_never_decoded() {
        let mut decoder = LineProtocolDecoder::stderr(ProcessKind::Analyzer);
        let events = decoder.feed(b"{\"type\":\"stats\",\"count\":1}\n");
        assert_eq!(
            events,
            vec![StatusEvent::log(
                ProcessKind::Analyzer,
                Severity::Error,
                "{\"type\":\"stats\",\"count\":1}"
            )]
        );
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut decoder = LineProtocolDecoder::stdout(ProcessKind::Relay);
        assert!(decoder.feed(b"listener opened on :8554").is_empty());
        assert_eq!(
            decoder.finish(),
            Some(StatusEvent::log(
                ProcessKind::Relay,
                Severity::Info,
                "listener opened on :8554"
            ))
        );
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let mut buffer = LineBuffer::new();
        let lines = buffer.push(b"ok \xff\xfe end\nnext");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("ok "));
        assert!(lines[0].ends_with(" end"));
        assert_eq!(buffer.pending_len(), 4);
    }
}
