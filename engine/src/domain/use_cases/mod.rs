pub mod get_service_status;
pub mod list_services;
pub mod service_logs;
pub mod start_service;
pub mod stop_service;

pub use get_service_status::{GetServiceStatus, GetServiceStatusUseCase};
pub use list_services::{ListServices, ListServicesUseCase};
pub use service_logs::ServiceLogsUseCase;
pub use start_service::{StartService, StartServiceUseCase};
pub use stop_service::{StopService, StopServiceUseCase};

use crate::constants::commands::{
    BUILD_TIMEOUT_SECS, HEALTH_TIMEOUT_SECS, STOP_TIMEOUT_SECS, SYNC_TIMEOUT_SECS,
};
use std::time::Duration;

/// Ceilings for the shell commands a lifecycle operation runs
#[derive(Debug, Clone)]
pub struct CommandTimeouts {
    pub sync: Duration,
    pub build: Duration,
    pub stop: Duration,
    pub health: Duration,
}

impl Default for CommandTimeouts {
    fn default() -> Self {
        Self {
            sync: Duration::from_secs(SYNC_TIMEOUT_SECS),
            build: Duration::from_secs(BUILD_TIMEOUT_SECS),
            stop: Duration::from_secs(STOP_TIMEOUT_SECS),
            health: Duration::from_secs(HEALTH_TIMEOUT_SECS),
        }
    }
}
