//! Path utilities and file system helpers

use std::path::PathBuf;

use crate::error::StorageError;

/// Environment variable that relocates the application data directory
pub const DATA_DIR_ENV: &str = "NEXLYN_DATA_DIR";

/// Gets the application data directory
pub fn get_app_data_dir() -> Result<PathBuf, StorageError> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|p| p.join("com.nexlyn.catalog"))
        .ok_or_else(|| StorageError::Location("Could not find app data directory".to_string()))
}

/// Clears all application data
pub fn clear_app_data() -> Result<(), StorageError> {
    let app_dir = get_app_data_dir()?;
    if app_dir.exists() {
        std::fs::remove_dir_all(&app_dir)?;
    }
    Ok(())
}

/// Gets the durable catalog database path
pub fn get_db_path() -> Result<PathBuf, StorageError> {
    get_app_data_dir().map(|p| p.join("catalog.db"))
}

/// Gets the application config file path
pub fn get_config_path() -> Result<PathBuf, StorageError> {
    get_app_data_dir().map(|p| p.join("config.json"))
}
