//! StopService use case
//! Runs the stop command, frees the port and forgets the run handle

use super::CommandTimeouts;
use crate::domain::ports::{
    CommandOutput, ConfigStore, ProcessSupervisor, RunHandleRepository, ShellCommand,
};
use crate::domain::services::ResolvedService;
use crate::domain::{DomainError, StopServiceCommand, StopServiceResponse};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Use case for stopping a service
#[async_trait]
pub trait StopService: Send + Sync {
    async fn execute(&self, command: StopServiceCommand)
        -> Result<StopServiceResponse, DomainError>;
}

/// Implementation of StopService use case
pub struct StopServiceUseCase {
    config_store: Arc<dyn ConfigStore>,
    supervisor: Arc<dyn ProcessSupervisor>,
    run_handles: Arc<dyn RunHandleRepository>,
    timeouts: CommandTimeouts,
}

impl StopServiceUseCase {
    pub fn new(
        config_store: Arc<dyn ConfigStore>,
        supervisor: Arc<dyn ProcessSupervisor>,
        run_handles: Arc<dyn RunHandleRepository>,
    ) -> Self {
        Self {
            config_store,
            supervisor,
            run_handles,
            timeouts: CommandTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: CommandTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    async fn run_stop_command(
        &self,
        service: &ResolvedService,
        stop_command: &str,
    ) -> Result<(), DomainError> {
        info!(service = %service.name, command = %stop_command, "Running stop command");

        let command = ShellCommand::new(stop_command, self.timeouts.stop)
            .in_dir(service.working_dir.clone())
            .with_output(CommandOutput::Capture);
        let outcome = self.supervisor.run(command).await.map_err(|e| {
            DomainError::StopCommandError {
                service: service.name.clone(),
                message: e.to_string(),
            }
        })?;

        if outcome.success() {
            return Ok(());
        }

        let mut message = outcome.failure_reason(self.timeouts.stop);
        let stderr = outcome.stderr.trim();
        if !stderr.is_empty() {
            message = format!("{}: {}", message, stderr);
        }
        Err(DomainError::StopCommandError {
            service: service.name.clone(),
            message,
        })
    }
}

#[async_trait]
impl StopService for StopServiceUseCase {
    async fn execute(
        &self,
        command: StopServiceCommand,
    ) -> Result<StopServiceResponse, DomainError> {
        let name = command.service_name.as_str();
        let catalog = self.config_store.load().await?;
        let spec = catalog.service(name)?;
        let service = ResolvedService::resolve(name, spec, &catalog.base_paths);

        // 1. Service-specific stop command; a failure aborts the stop
        let ran_stop_command = match &service.stop_command {
            Some(stop_command) => {
                self.run_stop_command(&service, stop_command).await?;
                true
            }
            None => false,
        };

        // 2. Kill whatever still listens on the port
        if let Some(port) = spec.port {
            self.supervisor.kill_by_port(port).await;
        }

        // 3. Forget the handle whether or not the process actually died
        let previous = self.run_handles.remove(name).await?;

        if !ran_stop_command && spec.port.is_none() {
            if let Some(handle) = &previous {
                warn!(
                    service = %name,
                    pid = handle.pid,
                    "No stop command or port declared, process left running"
                );
            }
        }

        info!(service = %name, "Service stopped");
        Ok(StopServiceResponse {
            service: name.to_string(),
            ran_stop_command,
            freed_port: spec.port,
            previous_pid: previous.map(|h| h.pid),
        })
    }
}
