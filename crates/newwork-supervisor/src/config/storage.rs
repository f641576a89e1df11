use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::constants::{DEFAULT_CACHE_CAPACITY_BYTES, DEFAULT_FLUSH_EVERY_MS};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database directory. Empty means `<data_dir>/state`.
    pub path: PathBuf,
    pub cache_capacity_bytes: u64,
    pub flush_every_ms: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            cache_capacity_bytes: DEFAULT_CACHE_CAPACITY_BYTES,
            flush_every_ms: Some(DEFAULT_FLUSH_EVERY_MS),
        }
    }
}

impl StorageConfig {
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}
