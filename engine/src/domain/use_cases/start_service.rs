//! StartService use case
//! Resolves, syncs, builds, launches and waits for a service

use super::CommandTimeouts;
use crate::domain::ports::{
    CommandOutput, ConfigStore, LogSink, PortProbe, ProcessExitHandle, ProcessSupervisor,
    RunHandleRepository, ShellCommand, SpawnConfig,
};
use crate::domain::services::{wait_for_port, ReadinessSettings, ResolvedService};
use crate::domain::{DomainError, RunHandle, StartServiceCommand, StartServiceResponse};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Use case for starting a service
#[async_trait]
pub trait StartService: Send + Sync {
    async fn execute(
        &self,
        command: StartServiceCommand,
    ) -> Result<StartServiceResponse, DomainError>;
}

/// Implementation of StartService use case
pub struct StartServiceUseCase {
    config_store: Arc<dyn ConfigStore>,
    supervisor: Arc<dyn ProcessSupervisor>,
    probe: Arc<dyn PortProbe>,
    log_sink: Arc<dyn LogSink>,
    run_handles: Arc<dyn RunHandleRepository>,
    readiness: ReadinessSettings,
    timeouts: CommandTimeouts,
}

impl StartServiceUseCase {
    pub fn new(
        config_store: Arc<dyn ConfigStore>,
        supervisor: Arc<dyn ProcessSupervisor>,
        probe: Arc<dyn PortProbe>,
        log_sink: Arc<dyn LogSink>,
        run_handles: Arc<dyn RunHandleRepository>,
    ) -> Self {
        Self {
            config_store,
            supervisor,
            probe,
            log_sink,
            run_handles,
            readiness: ReadinessSettings::default(),
            timeouts: CommandTimeouts::default(),
        }
    }

    pub fn with_readiness(mut self, readiness: ReadinessSettings) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn with_timeouts(mut self, timeouts: CommandTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// `git pull` the working directory, output appended to the log
    async fn sync_sources(
        &self,
        service: &str,
        dir: &Path,
        log_file: &Path,
    ) -> Result<(), DomainError> {
        let command = format!("git -C \"{}\" pull", dir.display());
        info!(service = %service, dir = %dir.display(), "Pulling latest sources");

        self.run_logged_step("GIT PULL", &command, None, self.timeouts.sync, log_file)
            .await
            .map_err(|message| DomainError::SyncError {
                service: service.to_string(),
                message,
                log_file: log_file.to_path_buf(),
            })
    }

    async fn build(
        &self,
        service: &ResolvedService,
        build: &str,
        log_file: &Path,
    ) -> Result<(), DomainError> {
        info!(service = %service.name, build = %build, "Building service");

        self.run_logged_step(
            "BUILD",
            build,
            service.working_dir.as_deref(),
            self.timeouts.build,
            log_file,
        )
        .await
        .map_err(|message| DomainError::BuildError {
            service: service.name.clone(),
            message,
            log_file: log_file.to_path_buf(),
        })
    }

    /// Run one shell step streaming into the log; `Err` carries the failure reason
    async fn run_logged_step(
        &self,
        label: &str,
        command: &str,
        working_dir: Option<&Path>,
        timeout: std::time::Duration,
        log_file: &Path,
    ) -> Result<(), String> {
        self.log_sink
            .append(log_file, &format!("[{}] {}\n", label, command))
            .await
            .map_err(|e| e.to_string())?;

        let step = ShellCommand::new(command, timeout)
            .in_dir(working_dir.map(Path::to_path_buf))
            .with_output(CommandOutput::AppendTo(log_file.to_path_buf()));

        let reason = match self.supervisor.run(step).await {
            Ok(outcome) if outcome.success() => return Ok(()),
            Ok(outcome) => outcome.failure_reason(timeout),
            Err(e) => e.to_string(),
        };

        if let Err(e) = self
            .log_sink
            .append(log_file, &format!("[{} FAILED] {}\n", label, reason))
            .await
        {
            debug!(error = %e, "Failed to append step failure to log");
        }
        Err(reason)
    }

    /// Record the exit code on the handle when the launched process ends
    fn attach_reaper(&self, service: &str, pid: u32, exit_handle: ProcessExitHandle) {
        let service = service.to_string();
        let run_handles = self.run_handles.clone();

        tokio::spawn(async move {
            match exit_handle.await {
                Ok(code) => {
                    info!(service = %service, pid = pid, exit_code = code, "Service process exited");
                    match run_handles.record_exit(&service, pid, code).await {
                        Ok(true) => {}
                        Ok(false) => debug!(
                            service = %service,
                            pid = pid,
                            "Exit of a superseded process, handle left untouched"
                        ),
                        Err(e) => warn!(service = %service, error = %e, "Failed to record exit"),
                    }
                }
                Err(e) => debug!(service = %service, pid = pid, error = %e, "Exit not observable"),
            }
        });
    }
}

#[async_trait]
impl StartService for StartServiceUseCase {
    async fn execute(
        &self,
        command: StartServiceCommand,
    ) -> Result<StartServiceResponse, DomainError> {
        let name = command.service_name.as_str();

        // 1. Look up and resolve the service
        let catalog = self.config_store.load().await?;
        let spec = catalog.service(name)?;
        let service = ResolvedService::resolve(name, spec, &catalog.base_paths);
        let launch = service
            .command
            .clone()
            .ok_or_else(|| DomainError::ConfigError {
                service: name.to_string(),
                reason: "no command defined".to_string(),
            })?;

        // 2. Fresh log file for this start
        let log_file = self.log_sink.create_log_file(name).await?;
        info!(service = %name, log_file = %log_file.display(), "Starting service");

        // 3. Sync sources
        if spec.git_auto_pull() {
            if let Some(dir) = &service.working_dir {
                self.sync_sources(name, dir, &log_file).await?;
            }
        }

        // 4. Build on request
        if command.force_build {
            match &service.build {
                Some(build) => self.build(&service, build, &log_file).await?,
                None => debug!(service = %name, "Build requested but none defined"),
            }
        }

        // 5. Free the port from stale listeners
        if let Some(port) = spec.port {
            self.supervisor.kill_by_port(port).await;
        }

        // 6. Launch
        self.log_sink
            .append(&log_file, &format!("[START] {}\n", launch))
            .await?;
        let spawned = self
            .supervisor
            .spawn(SpawnConfig {
                command: launch,
                working_dir: service.working_dir.clone(),
                log_file: log_file.clone(),
            })
            .await
            .map_err(|e| match e {
                DomainError::Spawn {
                    command, message, ..
                } => DomainError::Spawn {
                    command,
                    message,
                    log_file: Some(log_file.clone()),
                },
                other => other,
            })?;

        let pid = spawned.pid;
        self.run_handles
            .save(RunHandle::new(name, pid, log_file.clone()))
            .await?;
        if let Some(exit_handle) = spawned.exit_handle {
            self.attach_reaper(name, pid, exit_handle);
        }
        info!(service = %name, pid = pid, "Service process spawned");

        // 7. Wait for readiness; the process is left running on failure
        if let Some(port) = spec.port {
            match wait_for_port(self.probe.as_ref(), port, &self.readiness, &command.cancel).await
            {
                Ok(()) => info!(service = %name, port = port, "Service is accepting connections"),
                Err(DomainError::PortTimeout { port, timeout_ms }) => {
                    warn!(
                        service = %name,
                        port = port,
                        timeout_ms = timeout_ms,
                        "Service did not open its port in time"
                    );
                    let note = format!(
                        "[READINESS] port {} not open after {}ms\n",
                        port, timeout_ms
                    );
                    if let Err(e) = self.log_sink.append(&log_file, &note).await {
                        debug!(error = %e, "Failed to append readiness note to log");
                    }
                    return Err(DomainError::ReadinessTimeout {
                        service: name.to_string(),
                        port,
                        timeout_ms,
                        pid,
                        log_file,
                    });
                }
                Err(e) => {
                    info!(service = %name, error = %e, "Readiness wait aborted");
                    return Err(e);
                }
            }
        }

        Ok(StartServiceResponse {
            service: name.to_string(),
            pid,
            log_file,
            coalesced: false,
        })
    }
}
