//! GetServiceStatus use case
//! Derives liveness from the port, the health command or the run handle

use super::CommandTimeouts;
use crate::domain::ports::{ConfigStore, HealthCheckExecutor, PortProbe, RunHandleRepository};
use crate::domain::services::{ReadinessSettings, ResolvedService, ServiceLocks};
use crate::domain::{
    DomainError, GetServiceStatusQuery, HealthCheck, HealthStatus, Liveness, RunHandle,
    ServiceState, ServiceStatusResponse,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Use case for querying service status
#[async_trait]
pub trait GetServiceStatus: Send + Sync {
    async fn execute(
        &self,
        query: GetServiceStatusQuery,
    ) -> Result<ServiceStatusResponse, DomainError>;
}

/// Implementation of GetServiceStatus use case
///
/// Never takes the service lock; an operation in flight is reported through its phase.
pub struct GetServiceStatusUseCase {
    config_store: Arc<dyn ConfigStore>,
    probe: Arc<dyn PortProbe>,
    health: Arc<dyn HealthCheckExecutor>,
    run_handles: Arc<dyn RunHandleRepository>,
    locks: Arc<ServiceLocks>,
    probe_host: String,
    timeouts: CommandTimeouts,
}

impl GetServiceStatusUseCase {
    pub fn new(
        config_store: Arc<dyn ConfigStore>,
        probe: Arc<dyn PortProbe>,
        health: Arc<dyn HealthCheckExecutor>,
        run_handles: Arc<dyn RunHandleRepository>,
        locks: Arc<ServiceLocks>,
    ) -> Self {
        Self {
            config_store,
            probe,
            health,
            run_handles,
            locks,
            probe_host: ReadinessSettings::default().host,
            timeouts: CommandTimeouts::default(),
        }
    }

    pub fn with_probe_host(mut self, host: impl Into<String>) -> Self {
        self.probe_host = host.into();
        self
    }

    pub fn with_timeouts(mut self, timeouts: CommandTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    async fn run_health_command(&self, service: &ResolvedService, command: &str) -> Liveness {
        let check = HealthCheck::new(command, self.timeouts.health)
            .with_working_dir(service.working_dir.clone());

        let status = self.health.check(&check).await.unwrap_or_else(|e| {
            debug!(service = %service.name, error = %e, "Health command could not run");
            HealthStatus::Unhealthy
        });
        status.into()
    }
}

/// Lifecycle state when no operation is in flight
fn settled_state(liveness: Liveness, handle: Option<&RunHandle>) -> ServiceState {
    match liveness {
        Liveness::Healthy => ServiceState::Running,
        Liveness::Unhealthy => ServiceState::Stopped,
        // A launch alone never proves a bare listener is up
        Liveness::NotCheckable => match handle {
            Some(h) if h.has_exited() => ServiceState::Stopped,
            _ => ServiceState::Unknown,
        },
    }
}

#[async_trait]
impl GetServiceStatus for GetServiceStatusUseCase {
    async fn execute(
        &self,
        query: GetServiceStatusQuery,
    ) -> Result<ServiceStatusResponse, DomainError> {
        let name = query.service_name.as_str();
        let catalog = self.config_store.load().await?;
        let spec = catalog.service(name)?;
        let service = ResolvedService::resolve(name, spec, &catalog.base_paths);
        let handle = self.run_handles.find_by_name(name).await?;

        let liveness = if let Some(port) = spec.port {
            self.probe.is_open(&self.probe_host, port).await.into()
        } else if let Some(command) = &service.health_command {
            self.run_health_command(&service, command).await
        } else if spec.is_listener() {
            Liveness::NotCheckable
        } else {
            handle.as_ref().map_or(false, |h| !h.has_exited()).into()
        };

        let state = self
            .locks
            .phase(name)
            .unwrap_or_else(|| settled_state(liveness, handle.as_ref()));

        debug!(service = %name, liveness = %liveness, state = %state, "Service status");

        Ok(ServiceStatusResponse {
            service: name.to_string(),
            running: liveness.is_running(),
            checkable: liveness.is_checkable(),
            liveness,
            state,
            port: spec.port,
            service_type: spec.service_type.clone(),
            path: spec.path.clone(),
            pid: handle.as_ref().map(|h| h.pid),
            log_file: handle.as_ref().map(|h| h.log_file.clone()),
            exit_code: handle.as_ref().and_then(|h| h.exit_code),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::{MockConfigStore, MockHealthChecker, MockPortProbe};
    use crate::domain::{Catalog, ServiceSpec};
    use crate::infrastructure::InMemoryRunHandleRepository;
    use std::path::PathBuf;

    struct Fixture {
        probe: Arc<MockPortProbe>,
        health: Arc<MockHealthChecker>,
        run_handles: Arc<InMemoryRunHandleRepository>,
        locks: Arc<ServiceLocks>,
        use_case: GetServiceStatusUseCase,
    }

    fn fixture() -> Fixture {
        let catalog = Catalog::default()
            .with_service("redis", ServiceSpec::new("redis-server").with_port(6379))
            .with_service(
                "worker",
                ServiceSpec::new("./worker").with_health_command("pgrep -f worker"),
            )
            .with_service("hook", ServiceSpec::new("nc -l 9000").with_type("listener"))
            .with_service("job", ServiceSpec::new("./job"));

        let probe = Arc::new(MockPortProbe::new());
        let health = Arc::new(MockHealthChecker::new());
        let run_handles = Arc::new(InMemoryRunHandleRepository::new());
        let locks = Arc::new(ServiceLocks::new());
        let use_case = GetServiceStatusUseCase::new(
            Arc::new(MockConfigStore::new(catalog)),
            probe.clone(),
            health.clone(),
            run_handles.clone(),
            locks.clone(),
        );

        Fixture {
            probe,
            health,
            run_handles,
            locks,
            use_case,
        }
    }

    async fn status(f: &Fixture, name: &str) -> ServiceStatusResponse {
        f.use_case
            .execute(GetServiceStatusQuery::new(name))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_port_service_follows_probe() {
        let f = fixture();

        let down = status(&f, "redis").await;
        assert!(!down.running);
        assert!(down.checkable);
        assert_eq!(down.state, ServiceState::Stopped);

        f.probe.open(6379);
        let up = status(&f, "redis").await;
        assert!(up.running);
        assert_eq!(up.state, ServiceState::Running);
        assert_eq!(up.port, Some(6379));
    }

    #[tokio::test]
    async fn test_health_command_decides_liveness() {
        let f = fixture();

        assert!(!status(&f, "worker").await.running);

        f.health.set("pgrep -f worker", HealthStatus::Healthy);
        let up = status(&f, "worker").await;
        assert!(up.running);
        assert!(up.checkable);
        assert_eq!(f.health.check_count(), 2);
    }

    #[tokio::test]
    async fn test_listener_is_not_checkable() {
        let f = fixture();
        let hook = status(&f, "hook").await;
        assert!(!hook.running);
        assert!(!hook.checkable);
        assert_eq!(hook.liveness, Liveness::NotCheckable);
        assert_eq!(hook.state, ServiceState::Unknown);
    }

    #[tokio::test]
    async fn test_launched_listener_is_never_reported_running() {
        let f = fixture();
        f.run_handles
            .save(RunHandle::new("hook", 40, PathBuf::from("/logs/hook/h.log")))
            .await
            .unwrap();

        let launched = status(&f, "hook").await;
        assert!(!launched.running);
        assert!(!launched.checkable);
        assert_eq!(launched.state, ServiceState::Unknown);
        assert_eq!(launched.pid, Some(40));

        f.run_handles.record_exit("hook", 40, 1).await.unwrap();
        assert_eq!(status(&f, "hook").await.state, ServiceState::Stopped);
    }

    #[tokio::test]
    async fn test_fallback_uses_run_handle() {
        let f = fixture();
        assert!(!status(&f, "job").await.running);

        f.run_handles
            .save(RunHandle::new("job", 12, PathBuf::from("/logs/job/j.log")))
            .await
            .unwrap();
        let running = status(&f, "job").await;
        assert!(running.running);
        assert_eq!(running.pid, Some(12));

        f.run_handles.record_exit("job", 12, 0).await.unwrap();
        let exited = status(&f, "job").await;
        assert!(!exited.running);
        assert_eq!(exited.exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_phase_overrides_settled_state() {
        let f = fixture();
        let guard = f.locks.acquire("redis").await;
        guard.set_phase(ServiceState::Starting);

        let starting = status(&f, "redis").await;
        assert_eq!(starting.state, ServiceState::Starting);
        assert!(!starting.running);
    }

    #[tokio::test]
    async fn test_status_unknown_service() {
        let f = fixture();
        let result = f.use_case.execute(GetServiceStatusQuery::new("ghost")).await;
        assert!(matches!(result, Err(DomainError::UnknownService(_))));
    }
}
