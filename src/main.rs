//! Skrift CLI entry point.

use anyhow::Result;
use clap::Parser;
use skrift::cli::{commands, Cli, Commands};
use skrift::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::load_from(cli.config.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("skrift={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            let config_path = cli.config.clone().unwrap_or_else(Settings::default_config_path);
            commands::run_doctor(&settings, &config_path)?;
        }

        Commands::Transcribe {
            references,
            concurrency,
            output,
        } => {
            commands::run_transcribe(references, *concurrency, output.clone(), settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, cli.config.clone())?;
        }
    }

    Ok(())
}
