//! PortProbe port
//! Interface for checking whether a TCP port accepts connections

use async_trait::async_trait;

#[async_trait]
pub trait PortProbe: Send + Sync {
    /// True when a TCP connection to `host:port` succeeds; errors and timeouts are `false`
    async fn is_open(&self, host: &str, port: u16) -> bool;
}
