//! RunHandle value object
//! What the orchestrator remembers about a process it launched

use std::path::PathBuf;
use tokio::time::Instant;

/// Record of the last launch of a service
///
/// A handle is a hint, not proof of liveness: the process may have died or been killed
/// out of band. Liveness comes from the port probe or the health command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub service_name: String,
    pub pid: u32,
    pub log_file: PathBuf,
    pub started_at: Instant,
    /// Set by the exit reaper once the shell wrapper exits
    pub exit_code: Option<i32>,
}

impl RunHandle {
    pub fn new(service_name: impl Into<String>, pid: u32, log_file: PathBuf) -> Self {
        Self {
            service_name: service_name.into(),
            pid,
            log_file,
            started_at: Instant::now(),
            exit_code: None,
        }
    }

    pub fn has_exited(&self) -> bool {
        self.exit_code.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_handle_has_no_exit() {
        let handle = RunHandle::new("api", 42, PathBuf::from("/tmp/api.log"));
        assert_eq!(handle.pid, 42);
        assert!(!handle.has_exited());
    }
}
