//! SSE stream framing for the chat endpoint
//!
//! The tutor backend streams chat turns as `text/event-stream`: every event
//! is a `data: <json>` line followed by a blank line. This module turns the
//! raw HTTP byte stream into the sequence of data payload strings; the JSON
//! inside each payload is the session layer's business (see
//! `session::ingest`), so a payload that is not valid JSON still comes out
//! of here untouched.

use bytes::Bytes;
use futures::Stream;
use tokio::sync::mpsc;

/// Parse an SSE byte stream and forward complete `data:` payloads to
/// `frame_tx`.
///
/// This function is `async` and is intended to be run inside a
/// `tokio::spawn`. It consumes the stream until it ends or the transport
/// reports an error; a mid-stream transport error is treated the same as
/// stream closure, since there is no retry or cancellation layer.
///
/// Multi-line `data:` values are joined with `\n` per the SSE format;
/// comment lines (leading `:`) and unknown fields are ignored.
pub async fn parse_sse_stream(
    byte_stream: impl Stream<Item = reqwest::Result<Bytes>>,
    frame_tx: mpsc::UnboundedSender<String>,
) {
    use futures::StreamExt;

    // Buffer accumulates raw bytes between `\n\n` boundaries.
    let mut buffer = String::new();

    tokio::pin!(byte_stream);

    while let Some(chunk_result) = byte_stream.next().await {
        let chunk = match chunk_result {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Chat stream transport error, treating as closed: {}", e);
                break;
            }
        };

        let text = match std::str::from_utf8(&chunk) {
            Ok(s) => s.to_string(),
            Err(_) => continue,
        };

        buffer.push_str(&text);

        // SSE events are separated by blank lines (`\n\n`).
        while let Some(pos) = buffer.find("\n\n") {
            let event_block = buffer[..pos].to_string();
            buffer = buffer[pos + 2..].to_string();
            forward_event(&event_block, &frame_tx);
        }
    }

    // Process any remaining partial event in the buffer.
    if !buffer.is_empty() {
        forward_event(&buffer, &frame_tx);
    }
}

/// Extract the `data:` value from a single SSE event block and forward it.
fn forward_event(event_block: &str, frame_tx: &mpsc::UnboundedSender<String>) {
    let mut data_lines: Vec<&str> = Vec::new();

    for line in event_block.lines() {
        if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.trim());
        }
        // Lines starting with `:` are SSE comments; all others are ignored.
    }

    let data = data_lines.join("\n");
    if data.is_empty() {
        return;
    }

    // A closed receiver means the consumer stopped reading (e.g. after an
    // error frame); dropping the rest of the stream is the intended
    // behavior, so the send result is ignored.
    let _ = frame_tx.send(data);
}
