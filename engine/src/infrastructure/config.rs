//! Catalog loading from a JSON file
//!
//! The file has the shape `{ "basePaths": {...}, "services": {...} }` and is re-read on
//! every load, so edits take effect on the next operation without restarting the daemon.

use crate::domain::ports::ConfigStore;
use crate::domain::{Catalog, DomainError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct FileConfigStore {
    path: PathBuf,
    /// Serializes writers; readers see either the old or the new file thanks to the rename
    write_lock: Mutex<()>,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse and validate a catalog document
pub fn parse_catalog(content: &str) -> Result<Catalog, DomainError> {
    let catalog: Catalog = serde_json::from_str(content)
        .map_err(|e| DomainError::InvalidCatalog(e.to_string()))?;
    catalog.validate()?;
    Ok(catalog)
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load(&self) -> Result<Catalog, DomainError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "Config file not found, using an empty catalog");
                return Ok(Catalog::default());
            }
            Err(e) => {
                return Err(DomainError::InvalidCatalog(format!(
                    "failed to read '{}': {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let catalog = parse_catalog(&content)?;
        debug!(
            path = %self.path.display(),
            services = catalog.services.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    async fn replace(&self, catalog: Catalog) -> Result<(), DomainError> {
        catalog.validate()?;
        let json = serde_json::to_string_pretty(&catalog)
            .map_err(|e| DomainError::InvalidCatalog(e.to_string()))?;

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, json).await?;
        tokio::fs::rename(&staging, &self.path).await?;

        info!(
            path = %self.path.display(),
            services = catalog.services.len(),
            "Catalog replaced"
        );
        Ok(())
    }
}
