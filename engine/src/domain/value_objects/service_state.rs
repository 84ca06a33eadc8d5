//! ServiceState value object
//! Lifecycle state reported for a service

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    /// Not running
    Stopped,

    /// A start (or the start half of a restart) is in flight
    Starting,

    /// Liveness check passed
    Running,

    /// A stop (or the stop half of a restart) is in flight
    Stopping,

    /// No liveness signal and no run handle
    #[default]
    Unknown,
}

impl ServiceState {
    /// An operation currently holds the service lock
    pub fn is_transitional(&self) -> bool {
        matches!(self, ServiceState::Starting | ServiceState::Stopping)
    }

    /// Validate state transition
    pub fn can_transition_to(&self, new_state: ServiceState) -> bool {
        use ServiceState::*;

        match (self, new_state) {
            (Stopped | Unknown, Starting) => true,
            (Starting, Running) => true,
            (Starting, Stopped) => true, // Failed sync, build or readiness
            (Running, Stopping) => true,
            (Running, Starting) => true, // Repeated start against a live service
            (Stopping, Stopped) => true,
            (Stopping, Starting) => true, // Restart
            (Stopped | Unknown, Stopping) => true,
            (_, Unknown) => true,
            (a, b) if *a == b => true,
            _ => false,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Stopped => write!(f, "stopped"),
            ServiceState::Starting => write!(f, "starting"),
            ServiceState::Running => write!(f, "running"),
            ServiceState::Stopping => write!(f, "stopping"),
            ServiceState::Unknown => write!(f, "unknown"),
        }
    }
}
