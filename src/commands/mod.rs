//! Command handlers
//!
//! Each subcommand maps to one handler. Handlers log their progress, print
//! user-facing text to stdout and report failures as strings.

pub mod config;
pub mod download;
pub mod system;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::warn;

use crate::cli::{Cli, Command};
use crate::core::AppConfig;
use crate::utils::logging::init_tracing;

/// Result of a handler that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure,
}

impl From<CommandStatus> for ExitCode {
    fn from(status: CommandStatus) -> Self {
        match status {
            CommandStatus::Success => ExitCode::SUCCESS,
            CommandStatus::Failure => ExitCode::FAILURE,
        }
    }
}

/// Dispatch parsed CLI arguments to the matching handler.
pub async fn dispatch(cli: &Cli) -> Result<CommandStatus, String> {
    let config_path = config_path(cli)?;

    match cli.command.clone().unwrap_or(Command::Shell) {
        Command::Config { action } => config::handle(action, &config_path),
        Command::Shell => download::interactive(&effective_config(cli, &config_path)?).await,
        Command::Download { url } => {
            download::download_once(&effective_config(cli, &config_path)?, &url).await
        }
        Command::Check => system::check(&effective_config(cli, &config_path)?).await,
    }
}

fn config_path(cli: &Cli) -> Result<PathBuf, String> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => AppConfig::get_config_path().map_err(|e| format!("{:#}", e)),
    }
}

/// Configuration file merged with command-line overrides; also starts logging
pub fn effective_config(cli: &Cli, path: &Path) -> Result<AppConfig, String> {
    let mut config = AppConfig::load_or_default(path);

    if let Some(executable) = &cli.downloader {
        config.downloader.executable = executable.clone();
    }
    if let Some(template) = &cli.output_template {
        config.downloader.output_template = template.clone();
    }
    if let Some(level) = &cli.log_level {
        config.advanced.log_level = level.clone();
    }

    config
        .validate()
        .map_err(|e| format!("Invalid command-line override: {}", e))?;

    init_tracing(&config.advanced.log_level);
    if cli.downloader.is_some() || cli.output_template.is_some() {
        warn!("⚠️ Downloader settings overridden from the command line");
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn parse(dir: &TempDir, extra: &[&str]) -> Cli {
        let config = dir.path().join("config.json");
        let mut args = vec![
            "youtube-downloader".to_string(),
            "--config".to_string(),
            config.to_string_lossy().to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        Cli::parse_from(args)
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let dir = TempDir::new().unwrap();
        let cli = parse(
            &dir,
            &[
                "--downloader",
                "yt-dlp",
                "--output-template",
                "%(id)s.%(ext)s",
                "check",
            ],
        );

        let config = effective_config(&cli, &config_path(&cli).unwrap()).unwrap();
        assert_eq!(config.downloader.executable, "yt-dlp");
        assert_eq!(config.downloader.output_template, "%(id)s.%(ext)s");
        assert_eq!(config.ui, AppConfig::default().ui);
    }

    #[test]
    fn test_invalid_override_is_reported() {
        let dir = TempDir::new().unwrap();
        let cli = parse(&dir, &["--log-level", "chatty", "check"]);

        let err = effective_config(&cli, &config_path(&cli).unwrap()).unwrap_err();
        assert!(err.contains("Invalid log level"));
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let dir = TempDir::new().unwrap();
        let cli = parse(&dir, &[]);
        assert_eq!(config_path(&cli).unwrap(), dir.path().join("config.json"));
    }
}
