//! Chat stream ingestion
//!
//! One `StreamIngester` lives for one chat turn. It owns the pending
//! assistant entry, accumulates streamed deltas into it, and settles the
//! entry into exactly one terminal state. The server's completion frame
//! carries the authoritative full text; whatever the accumulator holds at
//! that point is discarded in its favor.

use crate::backend::SourceRef;
use crate::session::timeline::{EntryBody, EntryId, Timeline};
use serde::Deserialize;

/// Shown in place of an answer when a chat turn fails
pub const CHAT_FAILURE_MESSAGE: &str =
    "Sorry, I could not answer that. Please try again.";

/// One decoded chat stream frame
///
/// Variant order matters: serde tries them top to bottom, and the
/// discriminating field (`error`, `done`, `chunk`) is required in each, so a
/// frame can only land in the variant whose key it carries.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatPayload {
    Error {
        error: String,
    },
    Done {
        done: bool,
        full_response: String,
        #[serde(default)]
        sources: Vec<SourceRef>,
    },
    Chunk {
        chunk: String,
    },
}

/// What a single frame did to the turn
#[derive(Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A delta was appended; carries the delta text for live rendering
    Delta(String),
    /// The turn completed with authoritative text
    Finalized,
    /// The turn failed; the caller should stop reading the stream
    Failed,
    /// Frame was malformed or arrived after a terminal state; skipped
    Ignored,
}

#[derive(Debug, PartialEq, Eq)]
enum IngestState {
    Pending,
    Finalized,
    Failed,
}

/// Drives one pending assistant entry through a chat stream
#[derive(Debug)]
pub struct StreamIngester {
    entry_id: EntryId,
    accumulator: String,
    state: IngestState,
}

impl StreamIngester {
    /// Start ingesting into the given pending entry
    pub fn new(entry_id: EntryId) -> Self {
        Self {
            entry_id,
            accumulator: String::new(),
            state: IngestState::Pending,
        }
    }

    /// True once the turn reached Finalized or Failed
    pub fn is_terminal(&self) -> bool {
        self.state != IngestState::Pending
    }

    /// Apply one SSE data payload to the pending entry
    ///
    /// Malformed payloads are logged and skipped; they never abort the
    /// turn. After a terminal frame every further payload is ignored.
    pub fn apply_frame(&mut self, timeline: &mut Timeline, payload: &str) -> IngestOutcome {
        if self.is_terminal() {
            tracing::warn!("Dropping chat frame after terminal state: {}", payload);
            return IngestOutcome::Ignored;
        }

        let parsed: ChatPayload = match serde_json::from_str(payload) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Skipping malformed chat frame ({}): {}", e, payload);
                return IngestOutcome::Ignored;
            }
        };

        match parsed {
            ChatPayload::Chunk { chunk } => {
                self.accumulator.push_str(&chunk);
                let text = self.accumulator.clone();
                timeline.update_by_id(self.entry_id, |entry| {
                    entry.body = EntryBody::plain(text);
                });
                IngestOutcome::Delta(chunk)
            }
            ChatPayload::Done {
                done,
                full_response,
                sources,
            } => {
                if !done {
                    tracing::warn!("Completion frame with done=false, skipping");
                    return IngestOutcome::Ignored;
                }
                // The server's full text is authoritative even when it
                // differs from what was accumulated.
                timeline.update_by_id(self.entry_id, |entry| {
                    entry.body = EntryBody::Plain {
                        content: full_response.clone(),
                        sources: sources.clone(),
                    };
                });
                self.state = IngestState::Finalized;
                IngestOutcome::Finalized
            }
            ChatPayload::Error { error } => {
                tracing::warn!("Chat stream reported an error: {}", error);
                timeline.update_by_id(self.entry_id, |entry| {
                    entry.body = EntryBody::plain(CHAT_FAILURE_MESSAGE);
                });
                self.state = IngestState::Failed;
                IngestOutcome::Failed
            }
        }
    }

    /// Settle the entry after the stream ends
    ///
    /// A stream that closed without a terminal frame keeps whatever text
    /// accumulated; if nothing did, the empty pending entry is removed so
    /// the timeline shows no ghost turn.
    pub fn finish(self, timeline: &mut Timeline) {
        if self.is_terminal() {
            return;
        }
        if self.accumulator.is_empty() {
            tracing::debug!("Pruning empty pending entry {}", self.entry_id);
            timeline.remove(self.entry_id);
        }
    }
}
