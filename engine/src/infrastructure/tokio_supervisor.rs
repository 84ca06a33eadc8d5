//! Tokio-based process supervisor
//! Launches services and one-shot commands through the platform shell

use super::port_killer::{platform_port_killer, PortKiller};
use super::shell::shell_command;
use crate::domain::ports::{
    CommandOutcome, CommandOutput, ProcessExitHandle, ProcessSupervisor, ShellCommand,
    SpawnConfig, SpawnResult,
};
use crate::domain::DomainError;
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct TokioProcessSupervisor {
    port_killer: Arc<dyn PortKiller>,
}

impl TokioProcessSupervisor {
    pub fn new() -> Self {
        Self {
            port_killer: platform_port_killer(),
        }
    }

    pub fn with_port_killer(port_killer: Arc<dyn PortKiller>) -> Self {
        Self { port_killer }
    }

    /// Open a log file for appending, creating it if needed
    fn open_log(path: &Path, command: &str) -> Result<File, DomainError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| DomainError::Spawn {
                command: command.to_string(),
                message: format!("failed to open log file '{}': {}", path.display(), e),
                log_file: Some(path.to_path_buf()),
            })
    }

    /// stdout/stderr pair for a one-shot command
    fn configure_output(output: &CommandOutput, command: &str) -> Result<(Stdio, Stdio), DomainError> {
        match output {
            CommandOutput::Null => Ok((Stdio::null(), Stdio::null())),
            CommandOutput::Capture => Ok((Stdio::piped(), Stdio::piped())),
            CommandOutput::AppendTo(path) => {
                let file = Self::open_log(path, command)?;
                let err_file = file.try_clone()?;
                Ok((Stdio::from(file), Stdio::from(err_file)))
            }
        }
    }
}

impl Default for TokioProcessSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessSupervisor for TokioProcessSupervisor {
    async fn spawn(&self, config: SpawnConfig) -> Result<SpawnResult, DomainError> {
        info!(
            command = %config.command,
            log_file = %config.log_file.display(),
            "Spawning service process"
        );

        let log = Self::open_log(&config.log_file, &config.command)?;
        let err_log = log.try_clone()?;

        let mut cmd = shell_command(&config.command, config.working_dir.as_deref());
        cmd.stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(err_log));

        // Own process group: a Ctrl-C aimed at the daemon does not reach services
        #[cfg(unix)]
        cmd.process_group(0);

        let spawn_error = |message: String| DomainError::Spawn {
            command: config.command.clone(),
            message,
            log_file: Some(config.log_file.clone()),
        };

        let mut child = cmd.spawn().map_err(|e| {
            error!(command = %config.command, error = %e, "Failed to spawn process");
            spawn_error(e.to_string())
        })?;
        let pid = child
            .id()
            .ok_or_else(|| spawn_error("process exited before its pid was read".to_string()))?;

        debug!(pid = pid, "Process spawned");

        let exit_handle: ProcessExitHandle = Box::pin(async move {
            let status = child.wait().await.map_err(|e| {
                DomainError::Io(format!("failed to wait for process {}: {}", pid, e))
            })?;
            Ok(status.code().unwrap_or(-1))
        });

        Ok(SpawnResult {
            pid,
            exit_handle: Some(exit_handle),
        })
    }

    async fn run(&self, command: ShellCommand) -> Result<CommandOutcome, DomainError> {
        debug!(
            command = %command.command,
            timeout_secs = command.timeout.as_secs(),
            "Running command"
        );

        let (stdout, stderr) = Self::configure_output(&command.output, &command.command)?;
        let mut cmd = shell_command(&command.command, command.working_dir.as_deref());
        cmd.stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|e| DomainError::Spawn {
            command: command.command.clone(),
            message: e.to_string(),
            log_file: None,
        })?;
        let pid = child.id();

        match tokio::time::timeout(command.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(CommandOutcome {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                timed_out: false,
            }),
            Ok(Err(e)) => Err(DomainError::Io(format!(
                "failed to wait for '{}': {}",
                command.command, e
            ))),
            Err(_) => {
                warn!(
                    command = %command.command,
                    timeout_secs = command.timeout.as_secs(),
                    "Command timed out, killing it"
                );
                #[cfg(unix)]
                if let Some(pid) = pid {
                    super::shell::kill_process_group(pid);
                }
                #[cfg(not(unix))]
                let _ = pid;
                Ok(CommandOutcome {
                    timed_out: true,
                    ..CommandOutcome::default()
                })
            }
        }
    }

    async fn kill_by_port(&self, port: u16) {
        self.port_killer.kill_port(port).await;
    }
}
