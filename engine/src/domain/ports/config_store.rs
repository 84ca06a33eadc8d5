//! ConfigStore port
//! Source of the service catalog

use crate::domain::{Catalog, DomainError};
use async_trait::async_trait;

#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Current catalog snapshot
    async fn load(&self) -> Result<Catalog, DomainError>;

    /// Overwrite the whole catalog
    async fn replace(&self, catalog: Catalog) -> Result<(), DomainError>;
}
