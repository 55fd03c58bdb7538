//! Core business logic module
//!
//! This module contains the process runner, the shared output buffer and the
//! runtime that serializes download invocations.

pub mod command_line;
pub mod config;
pub mod controller;
pub mod models;
pub mod output_buffer;
pub mod process_runner;
pub mod runtime;



// Re-export commonly used types
pub use config::AppConfig;
pub use controller::{ClickOutcome, DownloadController};
pub use output_buffer::OutputBuffer;
