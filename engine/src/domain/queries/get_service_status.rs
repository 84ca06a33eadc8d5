//! GetServiceStatus Query

use crate::domain::{Liveness, ServiceState};
use serde::Serialize;
use std::path::PathBuf;

/// Query for the liveness of one service
#[derive(Debug, Clone)]
pub struct GetServiceStatusQuery {
    pub service_name: String,
}

impl GetServiceStatusQuery {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

/// Status of one service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatusResponse {
    pub service: String,
    pub running: bool,
    pub checkable: bool,
    pub liveness: Liveness,
    pub state: ServiceState,
    pub port: Option<u16>,
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Exit code recorded for the last launch, when its process has exited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}
