mod metrics;

pub use metrics::{StoreMetrics, StoreMetricsSnapshot};

use crate::config::StorageConfig;
use newwork_types::{NewworkError, NewworkResult, SavedAppState, APP_STATE_KEY};
use serde::{de::DeserializeOwned, Serialize};
use sled::{Db, Tree};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

const STATE_TREE: &str = "app_state";

/// Persistent JSON key-value store backing saved UI state.
pub struct StateStore {
    db: Db,
    state: Tree,
    config: StorageConfig,
    metrics: Arc<StoreMetrics>,
}

impl StateStore {
    pub fn open(config: StorageConfig) -> NewworkResult<Self> {
        if config.is_in_memory() {
            return Self::in_memory();
        }

        info!("Opening state store at {:?}", config.path);

        let db = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity_bytes)
            .flush_every_ms(config.flush_every_ms)
            .open()
            .map_err(|e| NewworkError::Storage(format!("Failed to open database: {}", e)))?;

        Self::from_db(db, config)
    }

    pub fn in_memory() -> NewworkResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| NewworkError::Storage(format!("Failed to open temp database: {}", e)))?;

        Self::from_db(db, StorageConfig::default())
    }

    fn from_db(db: Db, config: StorageConfig) -> NewworkResult<Self> {
        let state = db
            .open_tree(STATE_TREE)
            .map_err(|e| NewworkError::Storage(format!("Failed to open {} tree: {}", STATE_TREE, e)))?;

        Ok(Self {
            db,
            state,
            config,
            metrics: Arc::new(StoreMetrics::new()),
        })
    }

    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) -> NewworkResult<()> {
        self.metrics.writes.fetch_add(1, Ordering::Relaxed);

        let bytes = serde_json::to_vec(value)
            .map_err(|e| NewworkError::Serialization(format!("Failed to serialize {}: {}", key, e)))?;

        self.state.insert(key.as_bytes(), bytes).map_err(|e| {
            self.metrics.errors.fetch_add(1, Ordering::Relaxed);
            NewworkError::Storage(format!("Failed to store {}: {}", key, e))
        })?;

        debug!("Stored {}", key);
        Ok(())
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> NewworkResult<Option<T>> {
        self.metrics.reads.fetch_add(1, Ordering::Relaxed);

        let bytes = match self
            .state
            .get(key.as_bytes())
            .map_err(|e| NewworkError::Storage(format!("Failed to load {}: {}", key, e)))?
        {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let value = serde_json::from_slice(&bytes).map_err(|e| {
            self.metrics.errors.fetch_add(1, Ordering::Relaxed);
            NewworkError::Serialization(format!("Failed to deserialize {}: {}", key, e))
        })?;

        Ok(Some(value))
    }

    /// Returns whether the key existed.
    pub fn remove(&self, key: &str) -> NewworkResult<bool> {
        self.metrics.deletes.fetch_add(1, Ordering::Relaxed);

        let removed = self
            .state
            .remove(key.as_bytes())
            .map_err(|e| {
                self.metrics.errors.fetch_add(1, Ordering::Relaxed);
                NewworkError::Storage(format!("Failed to remove {}: {}", key, e))
            })?
            .is_some();

        Ok(removed)
    }

    pub fn contains(&self, key: &str) -> NewworkResult<bool> {
        self.state
            .contains_key(key.as_bytes())
            .map_err(|e| NewworkError::Storage(format!("Failed to query {}: {}", key, e)))
    }

    pub fn flush(&self) -> NewworkResult<()> {
        self.metrics.flushes.fetch_add(1, Ordering::Relaxed);
        self.db
            .flush()
            .map_err(|e| NewworkError::Storage(format!("Flush error: {}", e)))?;
        Ok(())
    }

    pub async fn flush_async(&self) -> NewworkResult<()> {
        self.metrics.flushes.fetch_add(1, Ordering::Relaxed);
        self.db
            .flush_async()
            .await
            .map_err(|e| NewworkError::Storage(format!("Flush error: {}", e)))?;
        Ok(())
    }

    pub fn save_app_state(&self, state: &SavedAppState) -> NewworkResult<()> {
        self.put_json(APP_STATE_KEY, state)?;
        self.flush()
    }

    pub fn load_app_state(&self) -> NewworkResult<Option<SavedAppState>> {
        self.get_json(APP_STATE_KEY)
    }

    pub fn clear_app_state(&self) -> NewworkResult<bool> {
        let removed = self.remove(APP_STATE_KEY)?;
        self.flush()?;
        Ok(removed)
    }

    pub fn metrics(&self) -> StoreMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn is_in_memory(&self) -> bool {
        self.config.is_in_memory()
    }
}

#[cfg(test)]
mod tests;
