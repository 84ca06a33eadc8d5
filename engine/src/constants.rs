//! Application-wide constants and default values
//!
//! Centralizes timeouts, intervals and file layout defaults

/// Readiness probing defaults
pub mod readiness {
    /// Host every port probe connects to
    pub const DEFAULT_PROBE_HOST: &str = "127.0.0.1";

    /// How long `start` waits for a service port to accept connections (milliseconds)
    pub const DEFAULT_PORT_WAIT_MS: u64 = 60_000;

    /// Per-attempt TCP connect timeout (milliseconds)
    pub const PROBE_CONNECT_TIMEOUT_MS: u64 = 1_000;

    /// Delay between two readiness probes (milliseconds)
    pub const POLL_INTERVAL_MS: u64 = 1_000;
}

/// Ceilings for shell commands run to completion
pub mod commands {
    /// `git pull` before a start (seconds)
    pub const SYNC_TIMEOUT_SECS: u64 = 600;

    /// Build command (seconds)
    pub const BUILD_TIMEOUT_SECS: u64 = 600;

    /// `stopCommand` (seconds)
    pub const STOP_TIMEOUT_SECS: u64 = 120;

    /// `healthCommand` (seconds)
    pub const HEALTH_TIMEOUT_SECS: u64 = 10;
}

/// Service catalog defaults
pub mod service {
    /// Applied when `gitAutoPull` is absent from a service definition
    pub const DEFAULT_GIT_AUTO_PULL: bool = true;

    /// `type` value marking a bare background listener with no liveness signal
    pub const LISTENER_TYPE: &str = "listener";

    /// Catalog key prefix of path templates, as in `${basePaths.KEY}`
    pub const BASE_PATHS_TOKEN: &str = "${basePaths.";
}

/// Log capture and streaming defaults
pub mod logs {
    /// Extension of every captured log file
    pub const LOG_EXTENSION: &str = "log";

    /// Interval between two size checks of a streamed log file (milliseconds)
    pub const STREAM_POLL_INTERVAL_MS: u64 = 1_000;

    /// Interval between heartbeat events on an idle stream (milliseconds)
    pub const STREAM_HEARTBEAT_INTERVAL_MS: u64 = 30_000;

    /// Buffered events per subscription before the poller waits for the reader
    pub const STREAM_CHANNEL_CAPACITY: usize = 64;

    /// Bytes of log attached to a failed operation's error response
    pub const ERROR_TAIL_BYTES: u64 = 16 * 1024;

    /// Default page size for ranged log reads
    pub const DEFAULT_PAGE_BYTES: u64 = 64 * 1024;
}

/// Daemon defaults
pub mod daemon {
    /// Default REST listen port
    pub const DEFAULT_PORT: u16 = 4000;

    /// Default REST bind address
    pub const DEFAULT_BIND: &str = "127.0.0.1";

    /// Default catalog location
    pub const DEFAULT_CONFIG_FILE: &str = "./config/services.json";

    /// Default log root
    pub const DEFAULT_LOG_DIR: &str = "./logs";

    /// Default tracing filter
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}
