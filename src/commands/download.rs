//! Download command handlers
//!
//! Wires the output buffer, the process runner, the download runtime and the
//! controller together, then drives them from the terminal.

use std::io;
use std::sync::Arc;

use tracing::{error, info, warn};

use super::CommandStatus;
use crate::core::config::DownloaderConfig;
use crate::core::controller::{ClickOutcome, DownloadController};
use crate::core::models::{AppResult, RunOutcome};
use crate::core::output_buffer::OutputBuffer;
use crate::core::process_runner::SystemProcessRunner;
use crate::core::runtime::spawn_download_runtime;
use crate::core::AppConfig;
use crate::terminal::{self, TerminalRenderer};
use crate::utils::file_utils::resolve_executable;

/// Build the controller for `config` on the current tokio runtime
pub fn build_controller(config: &AppConfig) -> AppResult<DownloadController> {
    let buffer = OutputBuffer::new(config.advanced.event_capacity);
    let runtime = spawn_download_runtime(Arc::new(SystemProcessRunner), buffer.clone())?;
    let downloader = DownloaderConfig {
        executable: resolve_executable(&config.downloader.executable)
            .to_string_lossy()
            .into_owned(),
        output_template: config.downloader.output_template.clone(),
    };
    info!("🔧 Using downloader {}", downloader.executable);
    Ok(DownloadController::new(buffer, runtime, downloader))
}

/// Interactive shell
pub async fn interactive(config: &AppConfig) -> Result<CommandStatus, String> {
    let controller = build_controller(config).map_err(|e| e.to_string())?;
    match terminal::run_shell(&controller, &config.ui).await {
        Ok(()) => Ok(CommandStatus::Success),
        Err(e) => {
            error!("❌ Shell stopped: {}", e);
            Err(e.to_string())
        }
    }
}

/// Download one link, printing output as it arrives
pub async fn download_once(config: &AppConfig, url: &str) -> Result<CommandStatus, String> {
    let controller = build_controller(config).map_err(|e| e.to_string())?;
    let mut renderer = TerminalRenderer::new(io::stdout(), controller.buffer().subscribe());

    let status = download_with(&controller, &mut renderer, url, config.ui.echo_command).await;
    renderer.drain().map_err(|e| e.to_string())?;
    status
}

/// Run one click through `controller` and render until the invocation settles
pub async fn download_with<W: io::Write>(
    controller: &DownloadController,
    renderer: &mut TerminalRenderer<W>,
    url: &str,
    echo_command: bool,
) -> Result<CommandStatus, String> {
    let ticket = match controller
        .on_download_clicked(url)
        .await
        .map_err(|e| e.to_string())?
    {
        ClickOutcome::Started(ticket) => ticket,
        ClickOutcome::Rejected(reason) => {
            warn!("⚠️ Link rejected: {}", reason);
            renderer.drain().map_err(|e| e.to_string())?;
            return Ok(CommandStatus::Failure);
        }
        ClickOutcome::Busy => return Err("A download is already in progress".to_string()),
    };

    if echo_command {
        writeln!(
            renderer.writer(),
            "$ {}",
            controller.request_for(url).command_string()
        )
        .map_err(|e| e.to_string())?;
    }

    let wait = ticket.wait();
    tokio::pin!(wait);
    let mut cancel_requested = false;

    let result = loop {
        tokio::select! {
            result = &mut wait => break result,
            rendered = renderer.next() => {
                if let Some(Err(e)) = rendered {
                    warn!("⚠️ Failed to print output: {}", e);
                }
            }
            signal = tokio::signal::ctrl_c(), if !cancel_requested => {
                if signal.is_ok() {
                    info!("🛑 Interrupt received, cancelling download");
                    cancel_requested = true;
                    controller.runtime().cancel().await.map_err(|e| e.to_string())?;
                }
            }
        }
    };

    renderer.drain().map_err(|e| e.to_string())?;
    match result {
        Ok(outcome) => Ok(status_for(&outcome)),
        // The error text is already in the buffer
        Err(e) => {
            error!("❌ Download failed: {}", e);
            Ok(CommandStatus::Failure)
        }
    }
}

fn status_for(outcome: &RunOutcome) -> CommandStatus {
    if outcome.success() {
        info!(
            "✅ Download finished in {} ms ({} lines)",
            outcome.elapsed_ms, outcome.lines
        );
        CommandStatus::Success
    } else {
        CommandStatus::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(executable: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.downloader.executable = executable.to_string();
        config.downloader.output_template = "%(id)s.%(ext)s".to_string();
        config
    }

    fn rendered(renderer: &mut TerminalRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.writer().clone()).unwrap()
    }

    #[tokio::test]
    async fn test_blank_link_fails_with_message() {
        let controller = build_controller(&config_with("youtube-dl")).unwrap();
        let mut renderer = TerminalRenderer::new(Vec::new(), controller.buffer().subscribe());

        let status = download_with(&controller, &mut renderer, "   ", false)
            .await
            .unwrap();

        assert_eq!(status, CommandStatus::Failure);
        assert_eq!(
            rendered(&mut renderer),
            "Input is blank. Please provide a valid youtube link\n"
        );
    }

    #[tokio::test]
    async fn test_invalid_link_fails_with_message() {
        let controller = build_controller(&config_with("youtube-dl")).unwrap();
        let mut renderer = TerminalRenderer::new(Vec::new(), controller.buffer().subscribe());

        let status = download_with(&controller, &mut renderer, "https://youtu.be/abc", false)
            .await
            .unwrap();

        assert_eq!(status, CommandStatus::Failure);
        assert!(rendered(&mut renderer).starts_with("Invalid URL.\nPlease enter a valid URL"));
    }

    #[tokio::test]
    async fn test_missing_downloader_reports_spawn_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("youtube-dl");
        let controller = build_controller(&config_with(&missing.to_string_lossy())).unwrap();
        let mut renderer = TerminalRenderer::new(Vec::new(), controller.buffer().subscribe());

        let status = download_with(
            &controller,
            &mut renderer,
            "https://www.youtube.com/watch?v=abc123",
            true,
        )
        .await
        .unwrap();

        assert_eq!(status, CommandStatus::Failure);
        let printed = rendered(&mut renderer);
        assert!(printed.starts_with("$ "));
        assert!(printed.contains("-o \"%(id)s.%(ext)s\" https://www.youtube.com/watch?v=abc123"));
        assert!(printed.contains("Failed to start"));
        assert!(!controller.runtime().is_busy().await.unwrap());
    }

    #[test]
    fn test_status_follows_exit_code() {
        let mut outcome = RunOutcome {
            exit_code: Some(0),
            lines: 2,
            cancelled: false,
            elapsed_ms: 5,
        };
        assert_eq!(status_for(&outcome), CommandStatus::Success);

        outcome.exit_code = Some(1);
        assert_eq!(status_for(&outcome), CommandStatus::Failure);

        outcome.exit_code = None;
        outcome.cancelled = true;
        assert_eq!(status_for(&outcome), CommandStatus::Failure);
    }
}
