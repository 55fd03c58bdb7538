//! Tracing subscriber setup
//!
//! Logs go to stderr so stdout carries nothing but the downloader's output.

use std::path::PathBuf;

pub fn resolve_log_dir() -> Result<PathBuf, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Failed to resolve current directory: {e}"))?;
    Ok(cwd.join("log"))
}

/// `RUST_LOG` wins over `level`
pub fn default_filter(level: &str) -> String {
    format!("youtube_downloader={level}")
}

pub fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(level).into());

    #[cfg(feature = "local-logging")]
    {
        use std::sync::OnceLock;
        use tracing_appender::non_blocking::WorkerGuard;

        static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

        let log_dir = match resolve_log_dir() {
            Ok(dir) => dir,
            Err(err) => {
                eprintln!("{err}");
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .try_init();
                return;
            }
        };

        if let Err(err) = std::fs::create_dir_all(&log_dir) {
            eprintln!("Failed to create log directory: {err}");
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
            return;
        }

        let file_appender = tracing_appender::rolling::never(&log_dir, "backend.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(guard);

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(non_blocking)
            .with_ansi(false)
            .try_init();
        return;
    }

    #[cfg(not(feature = "local-logging"))]
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_targets_crate() {
        assert_eq!(default_filter("debug"), "youtube_downloader=debug");
    }

    #[test]
    fn test_log_dir_is_under_cwd() {
        let dir = resolve_log_dir().unwrap();
        assert!(dir.ends_with("log"));
    }

    #[test]
    fn test_repeated_init_is_harmless() {
        init_tracing("info");
        init_tracing("debug");
    }
}
