//! Application configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::output_buffer::DEFAULT_EVENT_CAPACITY;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main application configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub downloader: DownloaderConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Bundled downloader invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Relative paths are looked up next to the working directory, then next to the binary
    pub executable: String,
    pub output_template: String,
}

/// Terminal presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    pub window_title: String,
    pub input_label: String,
    /// Print the constructed command before streaming its output
    pub echo_command: bool,
}

/// Advanced configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedConfig {
    pub log_level: String, // "error", "warn", "info", "debug", "trace"
    pub event_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            downloader: DownloaderConfig::default(),
            ui: UiConfig::default(),
            advanced: AdvancedConfig::default(),
        }
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            executable: "app/resources/youtube-dl".to_string(),
            output_template: "~/Downloads/%(title)s.%(ext)s".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_title: "Youtube downloader".to_string(),
            input_label: "Youtube link: https://www.youtube.com/watch?v=XXXX".to_string(),
            echo_command: false,
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, creating a default file if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;

            let config: AppConfig =
                serde_json::from_str(&content).with_context(|| "Failed to parse config file")?;

            tracing::info!("Loaded configuration from: {:?}", path);
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Created default configuration at: {:?}", path);
            Ok(config)
        }
    }

    /// Load from `path` and fall back to defaults when the file is unreadable or invalid
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(cfg) => match cfg.validate() {
                Ok(()) => cfg,
                Err(err) => {
                    tracing::warn!(
                        "Invalid configuration detected ({}), falling back to defaults",
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                tracing::warn!(
                    "Failed to load configuration from disk: {:#}. Using defaults",
                    err
                );
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = self.export()?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        tracing::info!("Saved configuration to: {:?}", path);
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn get_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "youtubedownloader", "youtube-downloader")
            .with_context(|| "Failed to get project directories")?;

        Ok(project_dirs.config_dir().join("config.json"))
    }

    /// Reset the file at `path` to defaults
    pub fn reset(path: &Path) -> Result<Self> {
        let config = Self::default();
        config.save_to(path)?;
        tracing::info!("Reset configuration to defaults");
        Ok(config)
    }

    /// Export configuration as JSON string
    pub fn export(&self) -> Result<String> {
        serde_json::to_string_pretty(self).with_context(|| "Failed to export configuration")
    }

    /// Parse and validate configuration from a JSON string
    pub fn import(json: &str) -> Result<Self> {
        let config: AppConfig =
            serde_json::from_str(json).with_context(|| "Failed to parse imported configuration")?;

        config
            .validate()
            .with_context(|| "Imported configuration is invalid")?;

        tracing::info!("Imported and validated configuration from JSON");
        Ok(config)
    }

    /// Write this configuration next to `path` under a timestamped name
    pub fn backup(&self, path: &Path) -> Result<PathBuf> {
        let backup_path = path.with_extension(format!(
            "backup.{}.json",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        ));

        std::fs::write(&backup_path, self.export()?)
            .with_context(|| format!("Failed to create backup: {:?}", backup_path))?;

        tracing::info!("Created configuration backup: {:?}", backup_path);
        Ok(backup_path)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.downloader.executable.trim().is_empty() {
            anyhow::bail!("Downloader executable must not be empty");
        }

        if self.downloader.output_template.trim().is_empty() {
            anyhow::bail!("Output template must not be empty");
        }

        if !LOG_LEVELS.contains(&self.advanced.log_level.as_str()) {
            anyhow::bail!(
                "Invalid log level: must be 'error', 'warn', 'info', 'debug', or 'trace'"
            );
        }

        if self.advanced.event_capacity == 0 || self.advanced.event_capacity > 65536 {
            anyhow::bail!("Event capacity should be between 1 and 65536");
        }

        Ok(())
    }
}
