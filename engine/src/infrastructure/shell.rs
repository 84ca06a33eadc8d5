//! Platform shell invocation

use std::path::Path;
use tokio::process::Command;

/// `sh -c <line>` on Unix, `cmd /C <line>` on Windows
pub(crate) fn shell_command(line: &str, working_dir: Option<&Path>) -> Command {
    #[cfg(windows)]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(line);
        cmd
    };

    #[cfg(not(windows))]
    let mut cmd = {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(line);
        cmd
    };

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }
    cmd
}

/// SIGKILL a whole process group (the group id is the leader's pid)
#[cfg(unix)]
pub(crate) fn kill_process_group(pgid: u32) {
    let result = unsafe { libc::kill(-(pgid as libc::pid_t), libc::SIGKILL) };
    if result != 0 {
        let err = std::io::Error::last_os_error();
        tracing::debug!(pgid = pgid, error = %err, "Failed to kill process group");
    }
}
