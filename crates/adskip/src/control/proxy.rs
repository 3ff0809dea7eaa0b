// Blackhole proxy: installs or clears the PAC script that drops ad requests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{AdSkipError, Result};

#[async_trait]
pub trait BlackholeProxy: Send + Sync {
    /// Route traffic through `pac_script`.
    async fn enable(&self, pac_script: &str) -> Result<()>;

    /// Restore direct routing. Clearing an already clear proxy succeeds.
    async fn clear(&self) -> Result<()>;
}

/// Publishes the PAC script as a file for a system or browser proxy setting
/// to point at. Clearing removes the file.
#[derive(Debug, Clone)]
pub struct PacFileProxy {
    path: PathBuf,
}

impl PacFileProxy {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_installed(&self) -> bool {
        self.path.is_file()
    }
}

#[async_trait]
impl BlackholeProxy for PacFileProxy {
    async fn enable(&self, pac_script: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AdSkipError::proxy(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        tokio::fs::write(&self.path, pac_script).await.map_err(|e| {
            AdSkipError::proxy(format!("failed to write {}: {e}", self.path.display()))
        })?;
        info!(path = %self.path.display(), "PAC script installed");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "PAC script removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "PAC script already absent");
                Ok(())
            }
            Err(e) => Err(AdSkipError::proxy(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}
