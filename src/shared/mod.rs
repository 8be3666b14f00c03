/// Shared modules used across the application
pub mod config;
pub mod i18n;
pub mod storage;
pub mod theme;

use anyhow::Result;
use std::path::PathBuf;

// Re-export commonly used items
pub use config::{Config, StyleVariant};
pub use i18n::{Dictionaries, DictionariesBuilder, I18n};
pub use storage::LocalStorage;
pub use theme::HeaderTheme;

/// Per-user data directory for storage and logs
pub fn app_data_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .ok_or_else(|| anyhow::anyhow!("Could not find a data directory"))?;
    Ok(base.join("gymx-header"))
}
