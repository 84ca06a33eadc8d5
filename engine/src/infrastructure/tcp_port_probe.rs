//! TCP port probe

use crate::constants::readiness::PROBE_CONNECT_TIMEOUT_MS;
use crate::domain::ports::PortProbe;
use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::trace;

/// Opens and immediately drops a TCP connection
pub struct TcpPortProbe {
    connect_timeout: Duration,
}

impl TcpPortProbe {
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_millis(PROBE_CONNECT_TIMEOUT_MS),
        }
    }

    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for TcpPortProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PortProbe for TcpPortProbe {
    async fn is_open(&self, host: &str, port: u16) -> bool {
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                trace!(host = %host, port = port, error = %e, "Port closed");
                false
            }
            Err(_) => {
                trace!(host = %host, port = port, "Port probe timed out");
                false
            }
        }
    }
}
