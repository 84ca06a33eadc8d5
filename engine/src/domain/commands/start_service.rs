//! StartService Command

use serde::Serialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Command to start a service
#[derive(Debug, Clone)]
pub struct StartServiceCommand {
    pub service_name: String,
    /// Run the service's `build` command before launching
    pub force_build: bool,
    /// Aborts the readiness wait; never kills a spawned process
    pub cancel: CancellationToken,
}

impl StartServiceCommand {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            force_build: false,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_build(mut self, force_build: bool) -> Self {
        self.force_build = force_build;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Response from starting a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartServiceResponse {
    pub service: String,
    pub pid: u32,
    pub log_file: PathBuf,
    /// The call waited on a concurrent start and returned its result
    pub coalesced: bool,
}
