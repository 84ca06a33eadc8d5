//! Health check value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// A shell health command and where to run it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    pub command: String,
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl HealthCheck {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            working_dir: None,
            timeout,
        }
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }
}

/// Outcome of one health command run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Liveness of a service as seen by `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liveness {
    Healthy,
    Unhealthy,
    /// The service declares no way to check it
    NotCheckable,
}

impl Liveness {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    pub fn is_checkable(&self) -> bool {
        !matches!(self, Self::NotCheckable)
    }
}

impl From<bool> for Liveness {
    fn from(alive: bool) -> Self {
        if alive {
            Self::Healthy
        } else {
            Self::Unhealthy
        }
    }
}

impl From<HealthStatus> for Liveness {
    fn from(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Healthy => Self::Healthy,
            HealthStatus::Unhealthy => Self::Unhealthy,
        }
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::NotCheckable => write!(f, "not_checkable"),
        }
    }
}
