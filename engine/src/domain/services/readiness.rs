//! Readiness waiting
//!
//! Polls a port until it accepts connections, a deadline passes, or the caller cancels.

use crate::constants::readiness::{DEFAULT_PORT_WAIT_MS, DEFAULT_PROBE_HOST, POLL_INTERVAL_MS};
use crate::domain::ports::PortProbe;
use crate::domain::DomainError;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How `start` waits for a service port
#[derive(Debug, Clone)]
pub struct ReadinessSettings {
    pub host: String,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_PROBE_HOST.to_string(),
            timeout: Duration::from_millis(DEFAULT_PORT_WAIT_MS),
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
        }
    }
}

/// Wait until `port` accepts connections
///
/// Fails with `PortTimeout` no earlier than `timeout` and no later than `timeout` plus one
/// probe, since the last sleep is cut to the remaining time. Cancellation is observed
/// during both probing and sleeping.
pub async fn wait_for_port(
    probe: &dyn PortProbe,
    port: u16,
    settings: &ReadinessSettings,
    cancel: &CancellationToken,
) -> Result<(), DomainError> {
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let open = tokio::select! {
            _ = cancel.cancelled() => return Err(cancelled(port)),
            open = probe.is_open(&settings.host, port) => open,
        };

        if open {
            debug!(port = port, attempts = attempts, "Port is accepting connections");
            return Ok(());
        }

        let elapsed = started.elapsed();
        if elapsed >= settings.timeout {
            debug!(port = port, attempts = attempts, "Gave up waiting for port");
            return Err(DomainError::PortTimeout {
                port,
                timeout_ms: settings.timeout.as_millis() as u64,
            });
        }

        let pause = settings.poll_interval.min(settings.timeout - elapsed);
        tokio::select! {
            _ = cancel.cancelled() => return Err(cancelled(port)),
            _ = tokio::time::sleep(pause) => {}
        }
    }
}

fn cancelled(port: u16) -> DomainError {
    DomainError::Cancelled(format!("wait for port {} cancelled", port))
}
