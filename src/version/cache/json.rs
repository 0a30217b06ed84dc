//! JSON file cache backend

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::version::cache::{CacheBackend, CacheMap};
use crate::version::error::CacheError;

/// Whole cache stored as one JSON object in a file
pub struct JsonFileCache {
    path: PathBuf,
}

impl JsonFileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn display_path(&self) -> PathBuf {
        std::path::absolute(&self.path).unwrap_or_else(|_| self.path.clone())
    }
}

impl CacheBackend for JsonFileCache {
    fn load(&self) -> Result<CacheMap, CacheError> {
        if !self.path.exists() {
            return Ok(CacheMap::new());
        }

        info!("Load Cache: {}", self.display_path().display());
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, entries: &CacheMap) -> Result<(), CacheError> {
        info!("Save Cache: {}", self.display_path().display());
        let content = serde_json::to_string(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
