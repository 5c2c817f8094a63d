//! Gurukul - Interactive AI tutor CLI
//!
//! Main entry point for the Gurukul application.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gurukul::cli::{Cli, Commands};
use gurukul::commands;
use gurukul::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments first so --verbose can shape the filter
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Topics { class_level } => {
            tracing::info!("Listing curriculum topics");
            commands::topics::run_topics(config, class_level).await?;
            Ok(())
        }
        Commands::Study { class_level, topic } => {
            tracing::info!("Starting study session");
            if let Some(t) = &topic {
                tracing::debug!("Opening topic: {}", t);
            }
            commands::study::run_study(config, class_level, topic).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "gurukul=debug" } else { "gurukul=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
