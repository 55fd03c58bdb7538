//! System checks for the external downloader

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use super::CommandStatus;
use crate::core::models::{AppError, AppResult};
use crate::core::AppConfig;
use crate::utils::file_utils::resolve_executable;

/// Check that the configured downloader starts
pub async fn check(config: &AppConfig) -> Result<CommandStatus, String> {
    let executable = downloader_path(config);
    info!("📺 Checking downloader availability: {:?}", executable);

    match check_downloader(&executable).await {
        Ok(Some(version)) => {
            info!("✅ Downloader is available");
            println!("{} {}", executable.display(), version);
            Ok(CommandStatus::Success)
        }
        Ok(None) => {
            warn!("⚠️ Downloader is not available");
            println!("{} is not available", executable.display());
            Ok(CommandStatus::Failure)
        }
        Err(e) => {
            error!("❌ Failed to check downloader: {}", e);
            Err(e.to_string())
        }
    }
}

/// First line of `<executable> --version`, or `None` when it cannot run
pub async fn check_downloader(executable: &Path) -> AppResult<Option<String>> {
    let output = tokio::process::Command::new(executable)
        .arg("--version")
        .stdin(std::process::Stdio::null())
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            Ok(Some(stdout.lines().next().unwrap_or_default().trim().to_string()))
        }
        Ok(_) => Ok(None),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Ok(None),
            _ => Err(AppError::System(format!(
                "Failed to check {}: {}",
                executable.display(),
                e
            ))),
        },
    }
}

/// Location the bundled downloader resolves to
pub fn downloader_path(config: &AppConfig) -> PathBuf {
    resolve_executable(&config.downloader.executable)
}
