use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Persistent string key/value store, one JSON object on disk
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the user's local data directory
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(super::app_data_dir()?.join("storage.json")))
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        // A corrupt file is replaced wholesale.
        let mut items = match self.read_content()? {
            Some(content) => self.parse(&content).unwrap_or_else(|e| {
                warn!("Overwriting unreadable storage: {e:#}");
                BTreeMap::new()
            }),
            None => BTreeMap::new(),
        };
        items.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&items)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match self.read_content()? {
            Some(content) => self.parse(&content),
            None => Ok(BTreeMap::new()),
        }
    }

    fn read_content(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&self.path)
            .map(Some)
            .with_context(|| format!("Failed to read {}", self.path.display()))
    }

    fn parse(&self, content: &str) -> Result<BTreeMap<String, String>> {
        serde_json::from_str(content)
            .with_context(|| format!("Corrupt storage file {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("storage.json"));
        assert_eq!(storage.get_item("site_lang").unwrap(), None);
    }

    #[test]
    fn test_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("nested").join("storage.json"));
        storage.set_item("site_lang", "en").unwrap();
        storage.set_item("other", "1").unwrap();
        storage.set_item("site_lang", "ar").unwrap();

        assert_eq!(storage.get_item("site_lang").unwrap().as_deref(), Some("ar"));
        assert_eq!(storage.get_item("other").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_corrupt_file_reads_as_error_and_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "[1, 2").unwrap();
        let storage = LocalStorage::new(&path);
        assert!(storage.get_item("site_lang").is_err());

        storage.set_item("site_lang", "en").unwrap();
        assert_eq!(storage.get_item("site_lang").unwrap().as_deref(), Some("en"));
    }
}
