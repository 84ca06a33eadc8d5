//! StopService Command

use serde::Serialize;

/// Command to stop a service
#[derive(Debug, Clone)]
pub struct StopServiceCommand {
    pub service_name: String,
}

impl StopServiceCommand {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

/// Response from stopping a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopServiceResponse {
    pub service: String,
    pub ran_stop_command: bool,
    /// Port whose listeners were killed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freed_port: Option<u16>,
    /// PID of the discarded run handle, if one existed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_pid: Option<u32>,
}
