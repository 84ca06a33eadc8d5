//! HealthCheckExecutor port
//! Interface for running a service's health command

use crate::domain::{DomainError, HealthCheck, HealthStatus};
use async_trait::async_trait;

#[async_trait]
pub trait HealthCheckExecutor: Send + Sync {
    /// Run the health command once
    ///
    /// Exit status 0 is `Healthy`, anything else (including a timeout) is `Unhealthy`.
    /// An `Err` means the command could not be launched at all.
    async fn check(&self, check: &HealthCheck) -> Result<HealthStatus, DomainError>;
}
