//! ListServices use case

use crate::domain::ports::ConfigStore;
use crate::domain::{DomainError, ListServicesResponse, ServiceSummary};
use async_trait::async_trait;
use std::sync::Arc;

/// Use case for listing the catalog
#[async_trait]
pub trait ListServices: Send + Sync {
    async fn execute(&self) -> Result<ListServicesResponse, DomainError>;
}

pub struct ListServicesUseCase {
    config_store: Arc<dyn ConfigStore>,
}

impl ListServicesUseCase {
    pub fn new(config_store: Arc<dyn ConfigStore>) -> Self {
        Self { config_store }
    }
}

#[async_trait]
impl ListServices for ListServicesUseCase {
    async fn execute(&self) -> Result<ListServicesResponse, DomainError> {
        let catalog = self.config_store.load().await?;

        // BTreeMap iteration keeps the names sorted
        let services = catalog
            .services
            .into_iter()
            .map(|(name, spec)| ServiceSummary {
                name,
                service_type: spec.service_type,
                port: spec.port,
                description: spec.description,
            })
            .collect();

        Ok(ListServicesResponse { services })
    }
}
