//! RestartService Command

use super::{StartServiceCommand, StartServiceResponse, StopServiceResponse};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Command to restart a service: stop then start under a single lock acquisition
#[derive(Debug, Clone)]
pub struct RestartServiceCommand {
    pub service_name: String,
    pub force_build: bool,
    pub cancel: CancellationToken,
}

impl RestartServiceCommand {
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

    /// The start half of the restart
    pub fn start_command(&self) -> StartServiceCommand {
        StartServiceCommand::new(self.service_name.clone())
            .with_build(self.force_build)
            .with_cancellation(self.cancel.clone())
    }
}

/// Response from restarting a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartServiceResponse {
    pub stopped: StopServiceResponse,
    pub started: StartServiceResponse,
}
