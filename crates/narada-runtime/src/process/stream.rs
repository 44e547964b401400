//! Reader tasks draining a child's stdout and stderr.
//!
//! Reads raw chunks rather than lines so the decoder's carry-over buffer
//! handles chunk boundaries, and invalid UTF-8 never ends a reader.

use std::sync::Arc;

use narada_core::{ProcessKind, StatusEmitter, StatusEvent};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::debug;

use super::decoder::{LineBuffer, LineProtocolDecoder};

const CHUNK_SIZE: usize = 4096;

/// Decode `stream` and publish every resulting event, in emission order.
pub(crate) fn spawn_event_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    mut decoder: LineProtocolDecoder,
    kind: ProcessKind,
    emitter: Arc<dyn StatusEmitter>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let channel = decoder.channel().as_str();
        let mut stream = stream;
        let mut chunk = vec![0_u8; CHUNK_SIZE];

        loop {
            match stream.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => {
                    for event in decoder.feed(&chunk[..n]) {
                        forward(kind, channel, &event, emitter.as_ref());
                    }
                }
                Err(e) => {
                    debug!(kind = %kind, channel, error = %e, "reader exiting on read error");
                    break;
                }
            }
        }

        if let Some(event) = decoder.finish() {
            forward(kind, channel, &event, emitter.as_ref());
        }
        debug!(kind = %kind, channel, "reader task exiting");
    })
}

fn forward(kind: ProcessKind, channel: &str, event: &StatusEvent, emitter: &dyn StatusEmitter) {
    if let StatusEvent::LogLine { text, .. } = event {
        debug!(kind = %kind, channel, "{text}");
    } else {
        debug!(kind = %kind, channel, event = event.event_name(), "structured record");
    }
    emitter.emit(event.clone());
}

/// Accumulate `stream` into a string, tracing each line as it arrives.
pub(crate) fn spawn_capture_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    kind: ProcessKind,
) -> JoinHandle<String> {
    tokio::spawn(async move {
        let mut stream = stream;
        let mut captured = Vec::new();
        let mut lines = LineBuffer::new();
        let mut chunk = vec![0_u8; CHUNK_SIZE];

        loop {
            match stream.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => {
                    captured.extend_from_slice(&chunk[..n]);
                    for line in lines.push(&chunk[..n]) {
                        debug!(kind = %kind, channel = "stdout", "{line}");
                    }
                }
                Err(e) => {
                    debug!(kind = %kind, error = %e, "capture reader exiting on read error");
                    break;
                }
            }
        }
        if let Some(line) = lines.finish() {
            debug!(kind = %kind, channel = "stdout", "{line}");
        }

        String::from_utf8_lossy(&captured).into_owned()
    })
}
