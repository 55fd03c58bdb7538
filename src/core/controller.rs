//! Download action of the interaction shell
//!
//! Mirrors what pressing "Download" does: refuse while a run is active,
//! validate the typed link, and either show the validation message in the
//! output buffer or hand the constructed command to the runtime.

use tracing::{debug, info, warn};

use crate::core::command_line::DownloadRequest;
use crate::core::config::DownloaderConfig;
use crate::core::models::{AppError, AppResult};
use crate::core::output_buffer::OutputBuffer;
use crate::core::runtime::{DownloadRuntimeHandle, InvocationTicket};
use crate::utils::validation::{extract_video_id, validate_youtube_url, ValidationError};

/// What a single Download click led to
#[derive(Debug)]
pub enum ClickOutcome {
    Started(InvocationTicket),
    Rejected(ValidationError),
    Busy,
}

#[derive(Clone)]
pub struct DownloadController {
    buffer: OutputBuffer,
    runtime: DownloadRuntimeHandle,
    downloader: DownloaderConfig,
}

impl DownloadController {
    /// `downloader.executable` is expected to be resolved already
    pub fn new(
        buffer: OutputBuffer,
        runtime: DownloadRuntimeHandle,
        downloader: DownloaderConfig,
    ) -> Self {
        Self {
            buffer,
            runtime,
            downloader,
        }
    }

    pub fn buffer(&self) -> &OutputBuffer {
        &self.buffer
    }

    pub fn runtime(&self) -> &DownloadRuntimeHandle {
        &self.runtime
    }

    pub fn request_for(&self, url: &str) -> DownloadRequest {
        DownloadRequest::new(
            self.downloader.executable.clone(),
            self.downloader.output_template.clone(),
            url,
        )
    }

    pub async fn on_download_clicked(&self, input: &str) -> AppResult<ClickOutcome> {
        if self.runtime.is_busy().await? {
            debug!("Download clicked while another invocation is running");
            return Ok(ClickOutcome::Busy);
        }

        let url = match validate_youtube_url(input) {
            Ok(url) => url,
            Err(reason) => {
                warn!("⚠️ Rejected input {:?}: {:?}", input, reason);
                self.buffer.replace(reason.to_string());
                return Ok(ClickOutcome::Rejected(reason));
            }
        };

        let request = self.request_for(url);
        info!(
            "📺 Downloading video {} with: {}",
            extract_video_id(url).unwrap_or_else(|| "<none>".to_string()),
            request.command_string()
        );

        match self.runtime.start(request.to_command_line()?).await {
            Ok(ticket) => Ok(ClickOutcome::Started(ticket)),
            Err(AppError::Busy) => Ok(ClickOutcome::Busy),
            Err(e) => Err(e),
        }
    }
}
