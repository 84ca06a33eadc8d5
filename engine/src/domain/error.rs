//! Domain-level errors
//! Every failure an orchestration call can surface to its caller

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DomainError {
    // Catalog errors
    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Service '{service}' is misconfigured: {reason}")]
    ConfigError { service: String, reason: String },

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    // Lifecycle step errors
    #[error("Git pull failed for {service}: {message}")]
    SyncError {
        service: String,
        message: String,
        log_file: PathBuf,
    },

    #[error("Build failed for {service}: {message}")]
    BuildError {
        service: String,
        message: String,
        log_file: PathBuf,
    },

    #[error("Stop command failed for {service}: {message}")]
    StopCommandError { service: String, message: String },

    #[error("Failed to spawn '{command}': {message}")]
    Spawn {
        command: String,
        message: String,
        log_file: Option<PathBuf>,
    },

    // Readiness errors
    #[error("Timeout waiting for port {port} after {timeout_ms}ms")]
    PortTimeout { port: u16, timeout_ms: u64 },

    #[error("Service '{service}' did not open port {port} within {timeout_ms}ms")]
    ReadinessTimeout {
        service: String,
        port: u16,
        timeout_ms: u64,
        pid: u32,
        log_file: PathBuf,
    },

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    // Log errors
    #[error("Invalid log file name: {0}")]
    InvalidLogFile(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl DomainError {
    /// Log file holding the output of the failed step, when the failure happened after one was created
    pub fn log_file(&self) -> Option<&Path> {
        match self {
            Self::SyncError { log_file, .. }
            | Self::BuildError { log_file, .. }
            | Self::ReadinessTimeout { log_file, .. } => Some(log_file.as_path()),
            Self::Spawn { log_file, .. } => log_file.as_deref(),
            _ => None,
        }
    }

    /// Stable machine-readable name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownService(_) => "unknown_service",
            Self::ConfigError { .. } => "config_error",
            Self::InvalidCatalog(_) => "invalid_catalog",
            Self::SyncError { .. } => "sync_error",
            Self::BuildError { .. } => "build_error",
            Self::StopCommandError { .. } => "stop_command_error",
            Self::Spawn { .. } => "spawn_error",
            Self::PortTimeout { .. } => "port_timeout",
            Self::ReadinessTimeout { .. } => "readiness_timeout",
            Self::Cancelled(_) => "cancelled",
            Self::InvalidLogFile(_) => "invalid_log_file",
            Self::Io(_) => "io_error",
        }
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
