//! Conversation timeline store
//!
//! The single source of truth for what a study session looks like: an
//! ordered, append-only log of conversation entries with targeted in-place
//! updates. Every mutation publishes a freshly cloned vector behind an
//! `Arc`, so a snapshot taken before an update never changes underneath its
//! holder.

use crate::backend::SourceRef;
use crate::session::quiz::{EvaluationReport, QuizState};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Identifier for one timeline entry
///
/// Unique within a session, monotonically assigned at creation time and
/// stable for the entry's lifetime. `clear()` does not reset the counter,
/// so ids never repeat within one session either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who produced an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// The payload of one timeline entry
///
/// A tagged union instead of a bag of optional fields: render and update
/// sites match exhaustively, so a quiz entry can never be half-treated as a
/// chat message.
#[derive(Debug, Clone)]
pub enum EntryBody {
    /// Free chat text; `sources` stays empty until stream completion
    Plain {
        content: String,
        sources: Vec<SourceRef>,
    },
    /// A generated topic summary
    Summary {
        content: String,
        key_points: Vec<String>,
    },
    /// An interactive quiz, optionally with its bound evaluation
    Quiz {
        quiz: QuizState,
        evaluation: Option<EvaluationReport>,
    },
}

impl EntryBody {
    /// Plain text body with no citations yet
    pub fn plain(content: impl Into<String>) -> Self {
        Self::Plain {
            content: content.into(),
            sources: Vec::new(),
        }
    }
}

/// One turn in the conversation timeline
#[derive(Debug, Clone)]
pub struct ConversationEntry {
    pub id: EntryId,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub body: EntryBody,
}

/// Ordered, copy-on-write conversation log
///
/// Entry order equals creation order and is never changed. Entries are
/// mutated in place by id; the only deletions are `clear()` (topic switch)
/// and `remove()` (pruning an abandoned streaming entry, used exclusively
/// by the stream ingester).
#[derive(Debug, Clone)]
pub struct Timeline {
    entries: Arc<Vec<ConversationEntry>>,
    next_id: u64,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Vec::new()),
            next_id: 1,
        }
    }

    /// Append an entry at the end, returning its freshly assigned id
    pub fn append(&mut self, role: Role, body: EntryBody) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;

        let mut entries = self.entries.as_ref().clone();
        entries.push(ConversationEntry {
            id,
            role,
            created_at: Utc::now(),
            body,
        });
        self.entries = Arc::new(entries);
        id
    }

    /// Apply a mutation to exactly one entry
    ///
    /// Returns false (and publishes nothing) when the id is absent.
    pub fn update_by_id(
        &mut self,
        id: EntryId,
        mutate: impl FnOnce(&mut ConversationEntry),
    ) -> bool {
        let Some(index) = self.entries.iter().position(|e| e.id == id) else {
            return false;
        };

        let mut entries = self.entries.as_ref().clone();
        mutate(&mut entries[index]);
        self.entries = Arc::new(entries);
        true
    }

    /// Remove one entry by id
    ///
    /// Only the stream ingester calls this, to prune a pending assistant
    /// entry whose stream closed before any content accumulated. Returns
    /// false when the id is absent.
    pub fn remove(&mut self, id: EntryId) -> bool {
        let Some(index) = self.entries.iter().position(|e| e.id == id) else {
            return false;
        };

        let mut entries = self.entries.as_ref().clone();
        entries.remove(index);
        self.entries = Arc::new(entries);
        true
    }

    /// Reset to empty (topic switch); the id counter keeps counting
    pub fn clear(&mut self) {
        self.entries = Arc::new(Vec::new());
    }

    /// A consistent view of the timeline at this instant
    pub fn snapshot(&self) -> Arc<Vec<ConversationEntry>> {
        Arc::clone(&self.entries)
    }

    /// Look up one entry by id
    pub fn get(&self, id: EntryId) -> Option<&ConversationEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Find the entry carrying the quiz with the given id
    ///
    /// Scans the whole timeline so any quiz in the session can be
    /// addressed, not just the most recently generated one.
    pub fn find_quiz_entry(&self, quiz_id: &str) -> Option<&ConversationEntry> {
        self.entries.iter().find(|e| {
            matches!(&e.body, EntryBody::Quiz { quiz, .. } if quiz.quiz_id == quiz_id)
        })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the timeline has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}
