//! Hand-written test doubles for the domain ports

use super::*;
use crate::domain::{Catalog, DomainError, HealthCheck, HealthStatus, LogChunk};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// Config store holding a catalog in memory
#[derive(Default)]
pub struct MockConfigStore {
    catalog: Mutex<Catalog>,
}

impl MockConfigStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Mutex::new(catalog),
        }
    }
}

#[async_trait]
impl ConfigStore for MockConfigStore {
    async fn load(&self) -> Result<Catalog, DomainError> {
        Ok(self.catalog.lock().unwrap().clone())
    }

    async fn replace(&self, catalog: Catalog) -> Result<(), DomainError> {
        catalog.validate()?;
        *self.catalog.lock().unwrap() = catalog;
        Ok(())
    }
}

/// Port probe answering from a shared set of open ports
#[derive(Default)]
pub struct MockPortProbe {
    open: Mutex<HashSet<u16>>,
    probes: AtomicUsize,
}

impl MockPortProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, port: u16) {
        self.open.lock().unwrap().insert(port);
    }

    pub fn close(&self, port: u16) {
        self.open.lock().unwrap().remove(&port);
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PortProbe for MockPortProbe {
    async fn is_open(&self, _host: &str, port: u16) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.open.lock().unwrap().contains(&port)
    }
}

/// Supervisor recording every call
///
/// Spawning opens `listen_port` on the linked probe (when set), killing a port closes it.
/// Commands containing a registered fragment exit with the registered code, all others exit 0.
pub struct MockSupervisor {
    probe: Option<Arc<MockPortProbe>>,
    listen_port: Mutex<Option<u16>>,
    spawn_delay: Mutex<Duration>,
    next_pid: AtomicU32,
    spawns: Mutex<Vec<SpawnConfig>>,
    runs: Mutex<Vec<ShellCommand>>,
    killed_ports: Mutex<Vec<u16>>,
    failing: Mutex<Vec<(String, i32)>>,
    exits: Mutex<HashMap<u32, oneshot::Sender<i32>>>,
}

impl MockSupervisor {
    pub fn new() -> Self {
        Self {
            probe: None,
            listen_port: Mutex::new(None),
            spawn_delay: Mutex::new(Duration::ZERO),
            next_pid: AtomicU32::new(1000),
            spawns: Mutex::new(Vec::new()),
            runs: Mutex::new(Vec::new()),
            killed_ports: Mutex::new(Vec::new()),
            failing: Mutex::new(Vec::new()),
            exits: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_probe(probe: Arc<MockPortProbe>) -> Self {
        Self {
            probe: Some(probe),
            ..Self::new()
        }
    }

    /// Port opened on the linked probe whenever a process is spawned
    pub fn listen_on(&self, port: u16) {
        *self.listen_port.lock().unwrap() = Some(port);
    }

    pub fn set_spawn_delay(&self, delay: Duration) {
        *self.spawn_delay.lock().unwrap() = delay;
    }

    pub fn fail_commands_containing(&self, fragment: &str, exit_code: i32) {
        self.failing
            .lock()
            .unwrap()
            .push((fragment.to_string(), exit_code));
    }

    /// Complete the exit handle of a spawned pid
    pub fn exit(&self, pid: u32, code: i32) {
        if let Some(tx) = self.exits.lock().unwrap().remove(&pid) {
            let _ = tx.send(code);
        }
    }

    pub fn spawns(&self) -> Vec<SpawnConfig> {
        self.spawns.lock().unwrap().clone()
    }

    pub fn runs(&self) -> Vec<String> {
        self.runs
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.command.clone())
            .collect()
    }

    pub fn killed_ports(&self) -> Vec<u16> {
        self.killed_ports.lock().unwrap().clone()
    }
}

impl Default for MockSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessSupervisor for MockSupervisor {
    async fn spawn(&self, config: SpawnConfig) -> Result<SpawnResult, DomainError> {
        let delay = *self.spawn_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        self.spawns.lock().unwrap().push(config);

        if let (Some(probe), Some(port)) = (&self.probe, *self.listen_port.lock().unwrap()) {
            probe.open(port);
        }

        let (tx, rx) = oneshot::channel();
        self.exits.lock().unwrap().insert(pid, tx);
        let exit_handle: ProcessExitHandle = Box::pin(async move {
            rx.await
                .map_err(|_| DomainError::Io("exit channel closed".to_string()))
        });

        Ok(SpawnResult {
            pid,
            exit_handle: Some(exit_handle),
        })
    }

    async fn run(&self, command: ShellCommand) -> Result<CommandOutcome, DomainError> {
        let code = self
            .failing
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| command.command.contains(fragment.as_str()))
            .map(|(_, code)| *code)
            .unwrap_or(0);
        self.runs.lock().unwrap().push(command);
        Ok(CommandOutcome::exited(code))
    }

    async fn kill_by_port(&self, port: u16) {
        self.killed_ports.lock().unwrap().push(port);
        if let Some(probe) = &self.probe {
            probe.close(port);
        }
    }
}

/// Health checker answering from a command → status table, unhealthy by default
#[derive(Default)]
pub struct MockHealthChecker {
    results: Mutex<HashMap<String, HealthStatus>>,
    checks: AtomicUsize,
}

impl MockHealthChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, command: &str, status: HealthStatus) {
        self.results
            .lock()
            .unwrap()
            .insert(command.to_string(), status);
    }

    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthCheckExecutor for MockHealthChecker {
    async fn check(&self, check: &HealthCheck) -> Result<HealthStatus, DomainError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .results
            .lock()
            .unwrap()
            .get(&check.command)
            .copied()
            .unwrap_or(HealthStatus::Unhealthy))
    }
}

/// Log sink keeping every file in memory under a virtual `/logs` root
#[derive(Default)]
pub struct MockLogSink {
    files: Mutex<BTreeMap<PathBuf, String>>,
    created: AtomicUsize,
}

impl MockLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn content(&self, path: &Path) -> String {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl LogSink for MockLogSink {
    async fn create_log_file(&self, service: &str) -> Result<PathBuf, DomainError> {
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        let path = PathBuf::from(format!("/logs/{}/{}-{:04}.log", service, service, n));
        self.files.lock().unwrap().insert(path.clone(), String::new());
        Ok(path)
    }

    fn log_path(&self, service: &str, file: &str) -> Result<PathBuf, DomainError> {
        if file.contains('/') || !file.ends_with(".log") {
            return Err(DomainError::InvalidLogFile(file.to_string()));
        }
        Ok(PathBuf::from(format!("/logs/{}/{}", service, file)))
    }

    async fn append(&self, path: &Path, text: &str) -> Result<(), DomainError> {
        self.files
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_default()
            .push_str(text);
        Ok(())
    }

    async fn clear(&self, path: &Path) -> Result<(), DomainError> {
        if let Some(content) = self.files.lock().unwrap().get_mut(path) {
            content.clear();
        }
        Ok(())
    }

    async fn list(&self, service: &str) -> Result<Vec<String>, DomainError> {
        let dir = PathBuf::from(format!("/logs/{}", service));
        let mut names: Vec<String> = self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|p| p.parent() == Some(dir.as_path()))
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        names.sort_by(|a, b| b.cmp(a));
        Ok(names)
    }

    async fn read(&self, path: &Path) -> Result<String, DomainError> {
        Ok(self.content(path))
    }

    async fn read_range(
        &self,
        path: &Path,
        offset: u64,
        limit: u64,
    ) -> Result<LogChunk, DomainError> {
        let content = self.content(path);
        let size = content.len() as u64;
        let start = offset.min(size) as usize;
        let end = offset.saturating_add(limit).min(size) as usize;
        Ok(LogChunk {
            content: content[start..end].to_string(),
            offset: start as u64,
            next_offset: end as u64,
            size,
        })
    }

    async fn tail(&self, path: &Path, max_bytes: u64) -> Result<String, DomainError> {
        let content = self.content(path);
        let start = content.len().saturating_sub(max_bytes as usize);
        Ok(content[start..].to_string())
    }
}
