//! Binary entrypoint for the `youtube-downloader` CLI.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Logging starts once the configuration is known, see commands::effective_config
    match youtube_downloader::run(std::env::args_os()).await {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
