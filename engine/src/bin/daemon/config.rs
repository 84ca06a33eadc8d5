//! Daemon configuration from environment variables
//!
//! All configuration is read from environment variables with sensible defaults.
//! This eliminates the need for command-line argument parsing (clap dependency).

use devsvc_engine::constants::daemon::{
    DEFAULT_BIND, DEFAULT_CONFIG_FILE, DEFAULT_LOG_DIR, DEFAULT_LOG_LEVEL, DEFAULT_PORT,
};
use devsvc_engine::constants::readiness::DEFAULT_PORT_WAIT_MS;
use devsvc_engine::ManagerSettings;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Daemon configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Service catalog (JSON)
    pub config_file: PathBuf,

    /// Root of the per-service log directories
    pub log_dir: PathBuf,

    /// REST API port
    pub port: u16,

    /// REST API bind address
    pub bind: String,

    /// Log level
    pub log_level: String,

    /// How long a start waits for the service port to open
    pub port_wait_ms: u64,
}

impl DaemonConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            config_file: env::var("DEVSVC_CONFIG_FILE")
                .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string())
                .into(),
            log_dir: env::var("DEVSVC_LOG_DIR")
                .unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string())
                .into(),
            port: Self::parse_u16("DEVSVC_PORT")
                .or_else(|| Self::parse_u16("PORT"))
                .unwrap_or(DEFAULT_PORT),
            bind: env::var("DEVSVC_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string()),
            log_level: Self::parse_log_level(),
            port_wait_ms: env::var("DEVSVC_PORT_WAIT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PORT_WAIT_MS),
        }
    }

    fn parse_u16(var_name: &str) -> Option<u16> {
        env::var(var_name).ok().and_then(|s| s.parse().ok())
    }

    fn parse_log_level() -> String {
        // Priority: DEVSVC_LOG_LEVEL > RUST_LOG > default
        env::var("DEVSVC_LOG_LEVEL")
            .or_else(|_| env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.bind.parse::<IpAddr>().is_err() {
            return Err(format!("DEVSVC_BIND is not an IP address: {}", self.bind));
        }
        if self.port_wait_ms == 0 {
            return Err("DEVSVC_PORT_WAIT_MS must be greater than zero".to_string());
        }
        if self.log_dir.as_os_str().is_empty() {
            return Err("DEVSVC_LOG_DIR must not be empty".to_string());
        }
        Ok(())
    }

    /// REST API address; only meaningful after `validate`
    pub fn listen_addr(&self) -> Result<SocketAddr, String> {
        let ip: IpAddr = self
            .bind
            .parse()
            .map_err(|_| format!("DEVSVC_BIND is not an IP address: {}", self.bind))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn manager_settings(&self) -> ManagerSettings {
        let mut settings = ManagerSettings::default();
        settings.readiness.timeout = Duration::from_millis(self.port_wait_ms);
        settings
    }
}
