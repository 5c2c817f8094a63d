//! Configuration management for Gurukul
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{GurukulError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Gurukul
///
/// Holds everything the client needs: where the tutor backend lives, the
/// default quiz composition, and the evidence-upload limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Tutor backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Default question counts for quiz generation
    #[serde(default)]
    pub quiz: QuizConfig,

    /// Evidence upload settings
    #[serde(default)]
    pub upload: UploadConfig,
}

/// Tutor backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the tutor backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds (also bounds each streamed chat turn)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Default question counts for quiz generation
///
/// The backend accepts 1-20 multiple choice, 1-10 fill-in-the-blank and
/// 1-10 short answer questions per quiz; `validate()` enforces the same
/// ranges locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Number of multiple-choice questions
    #[serde(default = "default_num_mcqs")]
    pub num_mcqs: u32,

    /// Number of fill-in-the-blank questions
    #[serde(default = "default_num_fill_blank")]
    pub num_fill_blank: u32,

    /// Number of short-answer questions
    #[serde(default = "default_num_short_answer")]
    pub num_short_answer: u32,
}

fn default_num_mcqs() -> u32 {
    5
}

fn default_num_fill_blank() -> u32 {
    3
}

fn default_num_short_answer() -> u32 {
    2
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            num_mcqs: default_num_mcqs(),
            num_fill_blank: default_num_fill_blank(),
            num_short_answer: default_num_short_answer(),
        }
    }
}

/// Evidence upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum evidence file size in bytes (the backend rejects over 10 MB)
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            quiz: QuizConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GurukulError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| GurukulError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("GURUKUL_BACKEND_URL") {
            self.backend.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("GURUKUL_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.backend.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid GURUKUL_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(num) = std::env::var("GURUKUL_QUIZ_MCQS") {
            if let Ok(value) = num.parse() {
                self.quiz.num_mcqs = value;
            } else {
                tracing::warn!("Invalid GURUKUL_QUIZ_MCQS: {}", num);
            }
        }

        if let Ok(num) = std::env::var("GURUKUL_QUIZ_FILL_BLANK") {
            if let Ok(value) = num.parse() {
                self.quiz.num_fill_blank = value;
            } else {
                tracing::warn!("Invalid GURUKUL_QUIZ_FILL_BLANK: {}", num);
            }
        }

        if let Ok(num) = std::env::var("GURUKUL_QUIZ_SHORT_ANSWER") {
            if let Ok(value) = num.parse() {
                self.quiz.num_short_answer = value;
            } else {
                tracing::warn!("Invalid GURUKUL_QUIZ_SHORT_ANSWER: {}", num);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(backend_url) = &cli.backend_url {
            self.backend.base_url = backend_url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the backend URL does not parse or the quiz counts
    /// fall outside the ranges the backend accepts.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.backend.base_url).map_err(|e| {
            GurukulError::Config(format!(
                "Invalid backend base_url '{}': {}",
                self.backend.base_url, e
            ))
        })?;

        if self.backend.timeout_seconds == 0 {
            return Err(GurukulError::Config(
                "backend.timeout_seconds must be greater than zero".to_string(),
            )
            .into());
        }

        if !(1..=20).contains(&self.quiz.num_mcqs) {
            return Err(GurukulError::Config(format!(
                "quiz.num_mcqs must be between 1 and 20, got {}",
                self.quiz.num_mcqs
            ))
            .into());
        }

        if !(1..=10).contains(&self.quiz.num_fill_blank) {
            return Err(GurukulError::Config(format!(
                "quiz.num_fill_blank must be between 1 and 10, got {}",
                self.quiz.num_fill_blank
            ))
            .into());
        }

        if !(1..=10).contains(&self.quiz.num_short_answer) {
            return Err(GurukulError::Config(format!(
                "quiz.num_short_answer must be between 1 and 10, got {}",
                self.quiz.num_short_answer
            ))
            .into());
        }

        if self.upload.max_file_bytes == 0 {
            return Err(GurukulError::Config(
                "upload.max_file_bytes must be greater than zero".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
