//! Health check executor implementation
//! Runs a service's health command through the platform shell

use super::shell::shell_command;
use crate::domain::ports::HealthCheckExecutor;
use crate::domain::{DomainError, HealthCheck, HealthStatus};
use async_trait::async_trait;
use std::process::Stdio;
use tracing::{debug, warn};

/// Exit status 0 means healthy
pub struct ShellHealthCheckExecutor;

impl ShellHealthCheckExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ShellHealthCheckExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthCheckExecutor for ShellHealthCheckExecutor {
    async fn check(&self, check: &HealthCheck) -> Result<HealthStatus, DomainError> {
        debug!(command = %check.command, "Running health command");

        let mut cmd = shell_command(&check.command, check.working_dir.as_deref());
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| DomainError::Spawn {
            command: check.command.clone(),
            message: e.to_string(),
            log_file: None,
        })?;

        match tokio::time::timeout(check.timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => Ok(HealthStatus::Healthy),
            Ok(Ok(status)) => {
                debug!(command = %check.command, exit_code = ?status.code(), "Health command failed");
                Ok(HealthStatus::Unhealthy)
            }
            Ok(Err(e)) => {
                warn!(command = %check.command, error = %e, "Health command wait failed");
                Ok(HealthStatus::Unhealthy)
            }
            Err(_) => {
                warn!(
                    command = %check.command,
                    timeout_secs = check.timeout.as_secs(),
                    "Health command timed out"
                );
                Ok(HealthStatus::Unhealthy)
            }
        }
    }
}
