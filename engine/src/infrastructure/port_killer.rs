//! Port killers
//!
//! Frees a TCP port by killing whatever process listens on it. Resolution of the
//! listening PIDs is platform specific: `lsof` on Unix, `netstat` on Windows.
//! Every failure is swallowed; a port nobody listens on is already free.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Upper bound for the PID lookup tool
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait PortKiller: Send + Sync {
    async fn kill_port(&self, port: u16);
}

/// Killer for the current platform
pub fn platform_port_killer() -> Arc<dyn PortKiller> {
    #[cfg(windows)]
    {
        Arc::new(NetstatPortKiller)
    }

    #[cfg(not(windows))]
    {
        Arc::new(LsofPortKiller)
    }
}

/// `lsof -t -iTCP:<port> -sTCP:LISTEN`, then SIGKILL each PID
#[cfg(unix)]
pub struct LsofPortKiller;

#[cfg(unix)]
#[async_trait]
impl PortKiller for LsofPortKiller {
    async fn kill_port(&self, port: u16) {
        let mut cmd = Command::new("lsof");
        cmd.arg("-nP")
            .arg("-t")
            .arg(format!("-iTCP:{}", port))
            .arg("-sTCP:LISTEN")
            .kill_on_drop(true);

        let Some(stdout) = lookup(cmd, port).await else {
            return;
        };

        for pid in parse_lsof_pids(&stdout) {
            if pid == std::process::id() {
                debug!(port = port, pid = pid, "Refusing to kill own process");
                continue;
            }
            let result = unsafe { libc::kill(pid as libc::pid_t, libc::SIGKILL) };
            if result == 0 {
                info!(port = port, pid = pid, "Killed process listening on port");
            } else {
                let err = std::io::Error::last_os_error();
                debug!(port = port, pid = pid, error = %err, "Failed to kill listener");
            }
        }
    }
}

/// `netstat -ano -p tcp`, then `taskkill /F /PID` each listening PID
#[cfg(windows)]
pub struct NetstatPortKiller;

#[cfg(windows)]
#[async_trait]
impl PortKiller for NetstatPortKiller {
    async fn kill_port(&self, port: u16) {
        let mut cmd = Command::new("netstat");
        cmd.args(["-ano", "-p", "tcp"]).kill_on_drop(true);

        let Some(stdout) = lookup(cmd, port).await else {
            return;
        };

        for pid in parse_netstat_listeners(&stdout, port) {
            if pid == std::process::id() {
                continue;
            }
            let status = Command::new("taskkill")
                .args(["/F", "/PID", &pid.to_string()])
                .kill_on_drop(true)
                .output()
                .await;
            match status {
                Ok(out) if out.status.success() => {
                    info!(port = port, pid = pid, "Killed process listening on port")
                }
                Ok(out) => debug!(port = port, pid = pid, code = ?out.status.code(), "taskkill failed"),
                Err(e) => debug!(port = port, pid = pid, error = %e, "taskkill could not run"),
            }
        }
    }
}

/// Run a PID lookup tool and return its stdout; any failure means "nothing to kill"
async fn lookup(mut cmd: Command, port: u16) -> Option<String> {
    match tokio::time::timeout(LOOKUP_TIMEOUT, cmd.output()).await {
        Ok(Ok(output)) => Some(String::from_utf8_lossy(&output.stdout).into_owned()),
        Ok(Err(e)) => {
            debug!(port = port, error = %e, "Port lookup tool unavailable");
            None
        }
        Err(_) => {
            debug!(port = port, "Port lookup timed out");
            None
        }
    }
}

/// One PID per line, as printed by `lsof -t`
pub fn parse_lsof_pids(output: &str) -> Vec<u32> {
    let mut pids: Vec<u32> = output
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect();
    pids.sort_unstable();
    pids.dedup();
    pids
}

/// PIDs of `LISTENING` rows whose local address ends in `:<port>`
pub fn parse_netstat_listeners(output: &str, port: u16) -> Vec<u32> {
    let suffix = format!(":{}", port);
    let mut pids: Vec<u32> = output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [_proto, local, _remote, state, pid]
                    if local.ends_with(&suffix) && state.eq_ignore_ascii_case("LISTENING") =>
                {
                    pid.parse().ok()
                }
                _ => None,
            }
        })
        .filter(|pid| *pid != 0)
        .collect();
    pids.sort_unstable();
    pids.dedup();
    pids
}
