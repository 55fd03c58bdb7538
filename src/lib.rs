//! Youtube Downloader - Core Library
//!
//! Validates YouTube watch links, runs the bundled downloader for them and
//! streams its console output into a shared buffer that the terminal renders.

pub mod cli;
pub mod commands;
pub mod core;
pub mod terminal;
pub mod utils;

// Re-export commonly used types
pub use crate::commands::CommandStatus;
pub use crate::core::{
    command_line::{CommandLine, DownloadRequest},
    config::AppConfig,
    controller::{ClickOutcome, DownloadController},
    models::{AppError, AppResult, RunOutcome, RuntimeEvent},
    output_buffer::{BufferEvent, OutputBuffer},
    process_runner::{run_console_app, ProcessRunner, SystemProcessRunner},
    runtime::{spawn_download_runtime, DownloadRuntimeHandle},
};
pub use crate::utils::validation::{validate_youtube_url, ValidationError};

use clap::error::ErrorKind;
use clap::Parser;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or a command cannot run.
pub async fn run<I, T>(args: I) -> Result<CommandStatus, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return Ok(CommandStatus::Success);
        }
        Err(err) => return Err(err.to_string()),
    };
    commands::dispatch(&cli).await
}
