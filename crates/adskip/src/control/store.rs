// Persisted activation flag.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AdSkipError, Result};

/// State used when nothing has been persisted yet.
pub const DEFAULT_ACTIVE: bool = true;

/// Durable storage for the activation flag.
#[async_trait]
pub trait ActivationStore: Send + Sync {
    /// The persisted flag, or `None` if it was never written.
    async fn load(&self) -> Result<Option<bool>>;

    async fn save(&self, active: bool) -> Result<()>;

    async fn load_or_default(&self) -> Result<bool> {
        Ok(self.load().await?.unwrap_or(DEFAULT_ACTIVE))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredState {
    #[serde(rename = "adBlockActive", default, skip_serializing_if = "Option::is_none")]
    ad_block_active: Option<bool>,
}

/// Stores the flag as a small JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ActivationStore for JsonFileStore {
    async fn load(&self) -> Result<Option<bool>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AdSkipError::store(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        let state: StoredState = serde_json::from_slice(&raw).map_err(|e| {
            AdSkipError::store(format!("corrupt state file {}: {e}", self.path.display()))
        })?;
        Ok(state.ad_block_active)
    }

    async fn save(&self, active: bool) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(&StoredState {
            ad_block_active: Some(active),
        })?;
        tokio::fs::write(&self.path, body).await.map_err(|e| {
            AdSkipError::store(format!("failed to write {}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), active, "Persisted activation state");
        Ok(())
    }
}

/// Process-local store, for hosts without durable storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Mutex<Option<bool>>,
}

impl MemoryStore {
    pub fn new(initial: Option<bool>) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }
}

#[async_trait]
impl ActivationStore for MemoryStore {
    async fn load(&self) -> Result<Option<bool>> {
        Ok(*self.value.lock())
    }

    async fn save(&self, active: bool) -> Result<()> {
        *self.value.lock() = Some(active);
        Ok(())
    }
}
