//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `youtube-downloader`.
#[derive(Debug, Parser)]
#[command(
    name = "youtube-downloader",
    version,
    about = "Download YouTube videos with the bundled youtube-dl"
)]
pub struct Cli {
    /// Configuration file to use instead of the per-user default.
    #[arg(long, global = true, env = "YOUTUBE_DOWNLOADER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Downloader executable, overrides the configured one.
    #[arg(long, global = true, env = "YOUTUBE_DL_PATH")]
    pub downloader: Option<String>,

    /// Output template passed to the downloader with `-o`.
    #[arg(long, global = true)]
    pub output_template: Option<String>,

    /// Log level for diagnostics on stderr.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// The command to execute; the interactive shell when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Supported top-level subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Prompt for links and stream each download.
    Shell,
    /// Download a single link and exit with the downloader's result.
    Download {
        /// YouTube watch link.
        url: String,
    },
    /// Check that the downloader can be started.
    Check,
    /// Inspect, reset or import the configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as JSON.
    Show,
    /// Print the configuration file location.
    Path,
    /// Back up the current file and restore defaults.
    Reset,
    /// Validate a JSON file and install it as the configuration.
    Import {
        /// File previously produced by `config show`.
        file: PathBuf,
    },
}
