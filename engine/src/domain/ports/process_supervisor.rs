//! ProcessSupervisor port
//! Interface for launching services and running one-shot shell commands

use crate::domain::DomainError;
use async_trait::async_trait;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

/// Configuration for spawning a long-running service process
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Shell command line
    pub command: String,
    pub working_dir: Option<PathBuf>,
    /// stdout and stderr are appended here
    pub log_file: PathBuf,
}

/// Handle for observing process exit
pub type ProcessExitHandle = Pin<Box<dyn Future<Output = Result<i32, DomainError>> + Send>>;

/// Result of spawning a process
pub struct SpawnResult {
    pub pid: u32,
    /// None when the process cannot be awaited
    pub exit_handle: Option<ProcessExitHandle>,
}

impl std::fmt::Debug for SpawnResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnResult")
            .field("pid", &self.pid)
            .field("exit_handle", &self.exit_handle.is_some())
            .finish()
    }
}

/// Where the output of a one-shot command goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Discarded
    Null,
    /// Collected into `CommandOutcome::stdout` / `stderr`
    Capture,
    /// Appended to a log file as it is produced
    AppendTo(PathBuf),
}

/// A shell command run to completion
#[derive(Debug, Clone)]
pub struct ShellCommand {
    pub command: String,
    pub working_dir: Option<PathBuf>,
    pub output: CommandOutput,
    /// The child is killed when the ceiling is exceeded
    pub timeout: Duration,
}

impl ShellCommand {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            working_dir: None,
            output: CommandOutput::Null,
            timeout,
        }
    }

    pub fn in_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn with_output(mut self, output: CommandOutput) -> Self {
        self.output = output;
        self
    }
}

/// How a one-shot command ended
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// None when killed by a signal or by the timeout
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl CommandOutcome {
    pub fn exited(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Short human-readable reason for a failed run
    pub fn failure_reason(&self, timeout: Duration) -> String {
        if self.timed_out {
            format!("timed out after {}s", timeout.as_secs())
        } else {
            match self.exit_code {
                Some(code) => format!("exited with code {}", code),
                None => "terminated by signal".to_string(),
            }
        }
    }
}

/// Port for supervising OS processes
#[async_trait]
pub trait ProcessSupervisor: Send + Sync {
    /// Launch a command through the platform shell and return immediately
    ///
    /// stdin is null; stdout and stderr are appended to `config.log_file`.
    async fn spawn(&self, config: SpawnConfig) -> Result<SpawnResult, DomainError>;

    /// Run a command through the platform shell to completion
    ///
    /// `Err` only when the command could not be launched; non-zero exits and timeouts are
    /// reported through the outcome.
    async fn run(&self, command: ShellCommand) -> Result<CommandOutcome, DomainError>;

    /// Kill every process listening on `port`
    ///
    /// Best effort: never fails, and no listener counts as success.
    async fn kill_by_port(&self, port: u16);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_success() {
        assert!(CommandOutcome::exited(0).success());
        assert!(!CommandOutcome::exited(2).success());

        let timed_out = CommandOutcome {
            exit_code: Some(0),
            timed_out: true,
            ..CommandOutcome::default()
        };
        assert!(!timed_out.success());
    }

    #[test]
    fn test_failure_reason() {
        let timeout = Duration::from_secs(600);
        assert_eq!(
            CommandOutcome::exited(3).failure_reason(timeout),
            "exited with code 3"
        );

        let timed_out = CommandOutcome {
            timed_out: true,
            ..CommandOutcome::default()
        };
        assert_eq!(timed_out.failure_reason(timeout), "timed out after 600s");
        assert_eq!(
            CommandOutcome::default().failure_reason(timeout),
            "terminated by signal"
        );
    }
}
