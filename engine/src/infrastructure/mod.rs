//! Infrastructure Layer
//!
//! This module contains the adapters that implement the ports defined in the domain layer.
//! These are the "driven adapters" (infrastructure implementations).
//!
//! ## Adapters
//!
//! - `FileConfigStore`: JSON catalog file
//! - `TokioProcessSupervisor`: shell-launched processes via `tokio::process`
//! - `TcpPortProbe`: TCP connect checks
//! - `ShellHealthCheckExecutor`: shell health commands
//! - `FileLogSink`: per-start log files under a log root
//! - `InMemoryRunHandleRepository`: thread-safe storage for run handles
//!
//! ## Usage
//!
//! ```rust,no_run
//! use devsvc_engine::infrastructure::{production_adapters, FileConfigStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(FileConfigStore::new("./config/services.json"));
//! let adapters = production_adapters(store, "./logs");
//! // Wire into a ServiceManager...
//! ```

pub mod config;
pub mod file_log_sink;
pub mod health_check_executor;
pub mod in_memory_repository;
pub mod port_killer;
mod shell;
pub mod tcp_port_probe;
pub mod tokio_supervisor;

pub use config::FileConfigStore;
pub use file_log_sink::FileLogSink;
pub use health_check_executor::ShellHealthCheckExecutor;
pub use in_memory_repository::InMemoryRunHandleRepository;
pub use port_killer::{platform_port_killer, PortKiller};
pub use tcp_port_probe::TcpPortProbe;
pub use tokio_supervisor::TokioProcessSupervisor;

use crate::application::Adapters;
use crate::domain::ports::ConfigStore;
use std::path::Path;
use std::sync::Arc;

/// Real adapters for every port, logging under `log_root`
pub fn production_adapters(
    config_store: Arc<dyn ConfigStore>,
    log_root: impl AsRef<Path>,
) -> Adapters {
    Adapters {
        config_store,
        supervisor: Arc::new(TokioProcessSupervisor::new()),
        probe: Arc::new(TcpPortProbe::new()),
        health: Arc::new(ShellHealthCheckExecutor::new()),
        log_sink: Arc::new(FileLogSink::new(log_root.as_ref())),
        run_handles: Arc::new(InMemoryRunHandleRepository::new()),
    }
}
