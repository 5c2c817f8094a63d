//! Session state engine
//!
//! The in-memory heart of the client: the conversation [`timeline`], the
//! chat stream [`ingest`]er, [`quiz`] lifecycle state, positional answer
//! reconciliation ([`reconcile`]), and the single-flight [`orchestrator`]
//! that ties them to the backend.

pub mod ingest;
pub mod orchestrator;
pub mod quiz;
pub mod reconcile;
pub mod timeline;

pub use orchestrator::{Session, SelectedTopic, SubmitOutcome};
pub use quiz::{EvaluationReport, EvidenceFile, Question, QuizState};
pub use timeline::{ConversationEntry, EntryBody, EntryId, Role, Timeline};
