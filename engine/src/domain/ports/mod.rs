pub mod config_store;
pub mod health_check_executor;
pub mod log_sink;
#[cfg(test)]
pub mod mocks;
pub mod port_probe;
pub mod process_supervisor;
pub mod run_handle_repository;

pub use config_store::ConfigStore;
pub use health_check_executor::HealthCheckExecutor;
pub use log_sink::LogSink;
pub use port_probe::PortProbe;
pub use process_supervisor::{
    CommandOutcome, CommandOutput, ProcessExitHandle, ProcessSupervisor, ShellCommand,
    SpawnConfig, SpawnResult,
};
pub use run_handle_repository::RunHandleRepository;
