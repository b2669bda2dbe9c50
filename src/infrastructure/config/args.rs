//! Command-line arguments.

use super::app_config::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Global flags plus the command to run.
#[derive(Debug, Parser)]
#[command(
    name = "feed-images",
    version,
    about = "Fetch images through a memory and response cache",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Response cache directory.
    #[arg(long, value_name = "PATH", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Maximum concurrent downloads.
    #[arg(long, global = true)]
    pub max_concurrent_downloads: Option<usize>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fetch each URL and report where it was served from.
    Fetch {
        /// Image URLs.
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,
    },
    /// Request every URL on one display slot, in order, and report what it ends up showing.
    Slot {
        /// Image URLs, in request order.
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,
    },
    /// Show response cache usage.
    Stats,
    /// Remove every cached response.
    Clear,
}
