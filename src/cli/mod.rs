//! CLI module for Skrift.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Skrift - transcript acquisition with automatic fallback
///
/// Tries caption lookup, then audio download and local speech-to-text, then
/// browser scraping, and prints the first transcript that comes through.
#[derive(Parser, Debug)]
#[command(name = "skrift")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SKRIFT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check external tools and configuration
    Doctor,

    /// Acquire transcripts for one or more videos
    Transcribe {
        /// YouTube URLs (watch, youtu.be, embed, shorts)
        #[arg(required = true)]
        references: Vec<String>,

        /// Maximum number of videos processed at once
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,

        /// Write transcripts to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration file if none exists
    Init,

    /// Show configuration file path
    Path,
}
