//! Configuration command handlers
//!
//! Show, locate, reset and import the configuration file.

use std::path::Path;

use tracing::{error, info};

use super::CommandStatus;
use crate::cli::ConfigAction;
use crate::core::AppConfig;

pub fn handle(action: ConfigAction, path: &Path) -> Result<CommandStatus, String> {
    match action {
        ConfigAction::Show => {
            info!("⚙️ Showing configuration from {:?}", path);
            println!("{}", show_config(path)?);
        }
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Reset => {
            info!("🔄 Resetting configuration to defaults");
            match reset_config(path) {
                Ok(Some(backup)) => {
                    info!("✅ Configuration reset successfully");
                    println!("Configuration reset, previous file saved to {}", backup);
                }
                Ok(None) => println!("Configuration reset"),
                Err(e) => {
                    error!("❌ Failed to reset configuration: {}", e);
                    return Err(e);
                }
            }
        }
        ConfigAction::Import { file } => {
            info!("📥 Importing configuration from {:?}", file);
            match import_config(&file, path) {
                Ok(backup) => {
                    info!("✅ Configuration imported successfully");
                    match backup {
                        Some(backup) => println!(
                            "Configuration imported, previous file saved to {}",
                            backup
                        ),
                        None => println!("Configuration imported"),
                    }
                }
                Err(e) => {
                    error!("❌ Failed to import configuration: {}", e);
                    return Err(e);
                }
            }
        }
    }
    Ok(CommandStatus::Success)
}

/// Pretty JSON of the file at `path`, created with defaults when missing
pub fn show_config(path: &Path) -> Result<String, String> {
    AppConfig::load_from(path)
        .and_then(|config| config.export())
        .map_err(|e| format!("{:#}", e))
}

/// Reset to defaults, returning the backup location when a readable file existed
pub fn reset_config(path: &Path) -> Result<Option<String>, String> {
    let backup = backup_existing(path)?;
    AppConfig::reset(path).map_err(|e| format!("{:#}", e))?;
    Ok(backup)
}

/// Install the configuration in `file` at `path`; invalid files leave `path` untouched
pub fn import_config(file: &Path, path: &Path) -> Result<Option<String>, String> {
    let json = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
    let config = AppConfig::import(&json).map_err(|e| format!("{:#}", e))?;

    let backup = backup_existing(path)?;
    config.save_to(path).map_err(|e| format!("{:#}", e))?;
    Ok(backup)
}

fn backup_existing(path: &Path) -> Result<Option<String>, String> {
    if !path.exists() {
        return Ok(None);
    }
    match AppConfig::load_from(path) {
        Ok(current) => current
            .backup(path)
            .map(|backup| Some(backup.display().to_string()))
            .map_err(|e| format!("{:#}", e)),
        Err(_) => Ok(None),
    }
}
