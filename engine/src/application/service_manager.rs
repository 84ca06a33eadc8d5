//! Service Manager
//!
//! Composition root and entry point of the orchestrator. Wires the use cases to the
//! adapters and adds what spans a whole operation: the per-service lock, the transitional
//! phase reported by `status`, and single-flight coalescing of concurrent starts.

use crate::domain::ports::{
    ConfigStore, HealthCheckExecutor, LogSink, PortProbe, ProcessSupervisor, RunHandleRepository,
};
use crate::domain::services::{
    LogStreamBroadcaster, LogStreamConfig, LogSubscription, ReadinessSettings, ServiceGuard,
    ServiceLocks,
};
use crate::domain::use_cases::{
    CommandTimeouts, GetServiceStatus, GetServiceStatusUseCase, ListServices, ListServicesUseCase,
    ServiceLogsUseCase, StartService, StartServiceUseCase, StopService, StopServiceUseCase,
};
use crate::domain::{
    Catalog, DomainError, GetServiceStatusQuery, ListServicesResponse, LogChunk,
    RestartServiceCommand, RestartServiceResponse, RunHandle, ServiceSpec, ServiceState,
    ServiceStatusResponse, StartServiceCommand, StartServiceResponse, StopServiceCommand,
    StopServiceResponse,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Driven adapters the manager is built from
#[derive(Clone)]
pub struct Adapters {
    pub config_store: Arc<dyn ConfigStore>,
    pub supervisor: Arc<dyn ProcessSupervisor>,
    pub probe: Arc<dyn PortProbe>,
    pub health: Arc<dyn HealthCheckExecutor>,
    pub log_sink: Arc<dyn LogSink>,
    pub run_handles: Arc<dyn RunHandleRepository>,
}

/// Timeouts and intervals of every operation
#[derive(Debug, Clone, Default)]
pub struct ManagerSettings {
    pub readiness: ReadinessSettings,
    pub timeouts: CommandTimeouts,
    pub log_stream: LogStreamConfig,
}

pub struct ServiceManager {
    config_store: Arc<dyn ConfigStore>,
    run_handles: Arc<dyn RunHandleRepository>,
    locks: Arc<ServiceLocks>,

    // Command use cases
    start_service: Arc<dyn StartService>,
    stop_service: Arc<dyn StopService>,

    // Query use cases
    get_status: Arc<dyn GetServiceStatus>,
    list_services: Arc<dyn ListServices>,
    logs: ServiceLogsUseCase,
}

impl ServiceManager {
    pub fn new(adapters: Adapters, settings: ManagerSettings) -> Self {
        let locks = Arc::new(ServiceLocks::new());

        let start_service: Arc<dyn StartService> = Arc::new(
            StartServiceUseCase::new(
                adapters.config_store.clone(),
                adapters.supervisor.clone(),
                adapters.probe.clone(),
                adapters.log_sink.clone(),
                adapters.run_handles.clone(),
            )
            .with_readiness(settings.readiness.clone())
            .with_timeouts(settings.timeouts.clone()),
        );

        let stop_service: Arc<dyn StopService> = Arc::new(
            StopServiceUseCase::new(
                adapters.config_store.clone(),
                adapters.supervisor.clone(),
                adapters.run_handles.clone(),
            )
            .with_timeouts(settings.timeouts.clone()),
        );

        let get_status: Arc<dyn GetServiceStatus> = Arc::new(
            GetServiceStatusUseCase::new(
                adapters.config_store.clone(),
                adapters.probe.clone(),
                adapters.health.clone(),
                adapters.run_handles.clone(),
                locks.clone(),
            )
            .with_probe_host(settings.readiness.host.clone())
            .with_timeouts(settings.timeouts.clone()),
        );

        let list_services: Arc<dyn ListServices> =
            Arc::new(ListServicesUseCase::new(adapters.config_store.clone()));

        let logs = ServiceLogsUseCase::new(
            adapters.log_sink.clone(),
            LogStreamBroadcaster::new(settings.log_stream),
        );

        Self {
            config_store: adapters.config_store,
            run_handles: adapters.run_handles,
            locks,
            start_service,
            stop_service,
            get_status,
            list_services,
            logs,
        }
    }

    /// Fail fast on unknown names so no lock slot is created for them
    async fn ensure_known(&self, service: &str) -> Result<(), DomainError> {
        self.config_store.load().await?.service(service).map(|_| ())
    }

    /// Start a service
    ///
    /// A call that waited on the service lock while another launch completed returns that
    /// launch instead of spawning again.
    pub async fn start(
        &self,
        command: StartServiceCommand,
    ) -> Result<StartServiceResponse, DomainError> {
        let name = command.service_name.clone();
        self.ensure_known(&name).await?;

        let seen_launches = self.locks.launches(&name);
        let guard = self.locks.acquire(&name).await;
        if guard.launches() != seen_launches {
            if let Some(handle) = self.run_handles.find_by_name(&name).await? {
                info!(service = %name, pid = handle.pid, "Joining start already completed");
                return Ok(StartServiceResponse {
                    service: name,
                    pid: handle.pid,
                    log_file: handle.log_file,
                    coalesced: true,
                });
            }
        }

        guard.set_phase(ServiceState::Starting);
        let previous = self.run_handles.find_by_name(&name).await?;
        let result = self.start_service.execute(command).await;
        self.count_launch(&guard, previous.as_ref()).await;
        result
    }

    pub async fn stop(
        &self,
        command: StopServiceCommand,
    ) -> Result<StopServiceResponse, DomainError> {
        self.ensure_known(&command.service_name).await?;

        let guard = self.locks.acquire(&command.service_name).await;
        guard.set_phase(ServiceState::Stopping);
        self.stop_service.execute(command).await
    }

    /// Stop then start without releasing the service lock in between
    pub async fn restart(
        &self,
        command: RestartServiceCommand,
    ) -> Result<RestartServiceResponse, DomainError> {
        let name = command.service_name.clone();
        self.ensure_known(&name).await?;

        let guard = self.locks.acquire(&name).await;
        info!(service = %name, build = command.force_build, "Restarting service");

        guard.set_phase(ServiceState::Stopping);
        let stopped = self
            .stop_service
            .execute(StopServiceCommand::new(name.clone()))
            .await?;

        guard.set_phase(ServiceState::Starting);
        let previous = self.run_handles.find_by_name(&name).await?;
        let result = self.start_service.execute(command.start_command()).await;
        self.count_launch(&guard, previous.as_ref()).await;

        Ok(RestartServiceResponse {
            stopped,
            started: result?,
        })
    }

    /// Count a launch when a new process was spawned under `guard`
    ///
    /// A start that fails after spawning (readiness timeout, cancelled wait) keeps its
    /// RunHandle and still counts, so a waiting start joins that process.
    async fn count_launch(&self, guard: &ServiceGuard, previous: Option<&RunHandle>) {
        let current = match self.run_handles.find_by_name(guard.service()).await {
            Ok(current) => current,
            Err(e) => {
                warn!(service = %guard.service(), error = %e, "Failed to read run handle");
                return;
            }
        };
        let spawned = match (previous, current) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(before), Some(after)) => {
                before.pid != after.pid || before.started_at != after.started_at
            }
        };
        if spawned {
            guard.record_launch();
        }
    }

    pub async fn status(
        &self,
        query: GetServiceStatusQuery,
    ) -> Result<ServiceStatusResponse, DomainError> {
        self.get_status.execute(query).await
    }

    pub async fn list_services(&self) -> Result<ListServicesResponse, DomainError> {
        self.list_services.execute().await
    }

    pub async fn describe(&self, service: &str) -> Result<ServiceSpec, DomainError> {
        self.config_store.load().await?.service(service).cloned()
    }

    pub async fn catalog(&self) -> Result<Catalog, DomainError> {
        self.config_store.load().await
    }

    /// Overwrite the catalog; running services keep their run handles
    pub async fn replace_catalog(&self, catalog: Catalog) -> Result<(), DomainError> {
        catalog.validate()?;
        self.config_store.replace(catalog).await
    }

    pub async fn list_logs(&self, service: &str) -> Result<Vec<String>, DomainError> {
        self.logs.list(service).await
    }

    pub async fn read_log(&self, service: &str, file: &str) -> Result<String, DomainError> {
        self.logs.read(service, file).await
    }

    pub async fn read_log_range(
        &self,
        service: &str,
        file: &str,
        offset: u64,
        limit: u64,
    ) -> Result<LogChunk, DomainError> {
        self.logs.read_range(service, file, offset, limit).await
    }

    pub async fn clear_log(&self, service: &str, file: &str) -> Result<(), DomainError> {
        self.logs.clear(service, file).await
    }

    pub fn subscribe_log(&self, service: &str, file: &str) -> Result<LogSubscription, DomainError> {
        self.logs.subscribe(service, file)
    }

    pub fn active_log_subscriptions(&self) -> usize {
        self.logs.active_subscriptions()
    }

    /// Tail of the log file attached to a failure, if any
    pub async fn failure_log(&self, err: &DomainError, max_bytes: u64) -> Option<String> {
        match err.log_file() {
            Some(path) => self.logs.tail(path, max_bytes).await,
            None => None,
        }
    }
}
