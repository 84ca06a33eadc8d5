//! RunHandleRepository port
//! Storage for the handles of launched services

use crate::domain::{DomainError, RunHandle};
use async_trait::async_trait;

#[async_trait]
pub trait RunHandleRepository: Send + Sync {
    /// Store the handle, replacing any previous one for the same service
    async fn save(&self, handle: RunHandle) -> Result<(), DomainError>;

    async fn find_by_name(&self, service: &str) -> Result<Option<RunHandle>, DomainError>;

    async fn find_all(&self) -> Result<Vec<RunHandle>, DomainError>;

    /// Remove and return the handle of `service`
    async fn remove(&self, service: &str) -> Result<Option<RunHandle>, DomainError>;

    /// Record the exit code on the handle of `service` if it still belongs to `pid`
    ///
    /// Returns false when the handle was removed or replaced meanwhile.
    async fn record_exit(&self, service: &str, pid: u32, code: i32) -> Result<bool, DomainError>;
}
