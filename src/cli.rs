//! Command-line interface definition for Gurukul
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for browsing topics and running a study session.

use clap::{Parser, Subcommand};

/// Gurukul - Interactive AI tutor CLI
///
/// Browse curriculum topics, chat with the tutor, generate quizzes and
/// submit answers (typed or photographed) for evaluation.
#[derive(Parser, Debug, Clone)]
#[command(name = "gurukul")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Override the tutor backend base URL
    #[arg(long, env = "GURUKUL_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Gurukul
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List class levels and their curriculum topics
    Topics {
        /// Only show topics for one class level (e.g. "Class VIII")
        #[arg(short = 'l', long = "class")]
        class_level: Option<String>,
    },

    /// Start an interactive study session
    Study {
        /// Class level to study (e.g. "Class IX"); prompted for when omitted
        #[arg(short = 'l', long = "class")]
        class_level: Option<String>,

        /// Topic id to open immediately (see `gurukul topics`)
        #[arg(short, long)]
        topic: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// A minimal Cli value for unit tests that exercise `Config::load`
    #[doc(hidden)]
    pub fn default_for_tests() -> Self {
        Self {
            config: None,
            backend_url: None,
            verbose: false,
            command: Commands::Topics { class_level: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_topics_command() {
        let cli = Cli::parse_from(["gurukul", "topics", "--class", "Class VIII"]);
        match cli.command {
            Commands::Topics { class_level } => {
                assert_eq!(class_level.as_deref(), Some("Class VIII"));
            }
            _ => panic!("expected topics command"),
        }
    }

    #[test]
    fn test_parse_study_command_with_topic() {
        let cli = Cli::parse_from([
            "gurukul",
            "study",
            "--class",
            "Class IX",
            "--topic",
            "ix_motion",
        ]);
        match cli.command {
            Commands::Study { class_level, topic } => {
                assert_eq!(class_level.as_deref(), Some("Class IX"));
                assert_eq!(topic.as_deref(), Some("ix_motion"));
            }
            _ => panic!("expected study command"),
        }
    }

    #[test]
    fn test_backend_url_flag() {
        let cli = Cli::parse_from(["gurukul", "--backend-url", "http://10.0.0.2:8000", "topics"]);
        assert_eq!(cli.backend_url.as_deref(), Some("http://10.0.0.2:8000"));
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::parse_from(["gurukul", "topics"]);
        assert_eq!(cli.config.as_deref(), Some("config/config.yaml"));
    }
}
