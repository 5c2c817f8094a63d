//! Gurukul - Interactive AI tutor CLI
//!
//! A terminal client for an AI tutor backend: browse curriculum topics, chat
//! with streamed answers, request summaries, generate quizzes, collect
//! answers (typed or via a photographed answer sheet) and submit them for
//! evaluation.
//!
//! The crate is organized around a backend boundary and a session engine:
//!
//! - [`backend`]: the [`backend::TutorBackend`] trait, its HTTP
//!   implementation and the wire types
//! - [`session`]: conversation timeline, chat stream ingestion, quiz
//!   lifecycle and the single-flight request orchestrator
//! - [`commands`]: CLI command handlers built on the above

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod session;

pub use config::Config;
pub use error::{GurukulError, Result};
pub use session::Session;
