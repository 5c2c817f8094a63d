//! Error types for Gurukul
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Gurukul operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, backend communication, streaming, and session
/// state transitions.
#[derive(Error, Debug)]
pub enum GurukulError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend-reported errors (non-success status with a detail string)
    #[error("Tutor service error: {0}")]
    Backend(String),

    /// Transport-level failures (connection refused, timeout, body read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Another network operation is already in flight
    #[error("Another request is still in progress; wait for it to finish")]
    Busy,

    /// A session operation needs a selected topic first
    #[error("No topic selected")]
    NoTopicSelected,

    /// Answer edits require an active, not-yet-evaluated quiz
    #[error("No active quiz; generate one with /quiz")]
    NoActiveQuiz,

    /// Submission referenced a quiz id absent from the timeline
    #[error("Quiz not found: {0}")]
    QuizNotFound(String),

    /// The referenced quiz already has an evaluation bound to it
    #[error("Quiz {0} was already evaluated")]
    AlreadyEvaluated(String),

    /// Evidence file rejected before upload (not an image, or too large)
    #[error("Invalid evidence file: {0}")]
    InvalidEvidence(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Gurukul operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
