//! Core data models for the downloader shell

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::utils::validation::ValidationError;

/// Identifier of one validate → spawn → stream → complete run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 短格式便于在终端里阅读
        let simple = self.0.simple().to_string();
        f.write_str(&simple[..8])
    }
}

/// Result of one finished child process run

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]

pub struct RunOutcome {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,

    pub lines: usize,

    pub cancelled: bool,

    pub elapsed_ms: u64,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        !self.cancelled && self.exit_code == Some(0)
    }

    /// Human readable exit description, e.g. `status 3`
    pub fn describe_exit(&self) -> String {
        match self.exit_code {
            Some(code) => format!("status {}", code),
            None => "termination by signal".to_string(),
        }
    }
}

/// Snapshot of the invocation currently owned by the runtime

#[derive(Debug, Clone, Serialize, Deserialize)]

pub struct InvocationSummary {
    pub id: InvocationId,

    pub command: String,

    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// Lifecycle notifications published by the download runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RuntimeEvent {
    Started {
        id: InvocationId,
        command: String,
    },
    Finished {
        id: InvocationId,
        outcome: RunOutcome,
    },
    Failed {
        id: InvocationId,
        error: String,
    },
}

/// Application error types

#[derive(Debug, thiserror::Error)]

pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("A download is already in progress")]
    Busy,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("System error: {0}")]
    System(String),
}

/// Result type alias for application operations

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_success_requires_zero_exit() {
        let mut outcome = RunOutcome {
            exit_code: Some(0),
            lines: 2,
            cancelled: false,
            elapsed_ms: 10,
        };
        assert!(outcome.success());

        outcome.exit_code = Some(1);
        assert!(!outcome.success());
        assert_eq!(outcome.describe_exit(), "status 1");

        outcome.exit_code = Some(0);
        outcome.cancelled = true;
        assert!(!outcome.success());

        outcome.exit_code = None;
        assert_eq!(outcome.describe_exit(), "termination by signal");
    }

    #[test]
    fn test_invocation_id_display_is_short() {
        let id = InvocationId::new();
        assert_eq!(id.to_string().len(), 8);
        assert_ne!(id, InvocationId::new());
    }

    #[test]
    fn test_spawn_error_names_program() {
        let err = AppError::Spawn {
            program: "app/resources/youtube-dl".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().starts_with("Failed to start app/resources/youtube-dl"));
    }
}
