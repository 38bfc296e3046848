// src/exec/kill.rs

//! Process-tree termination.
//!
//! On Unix every child is started as the leader of a new process group
//! (`process_group(0)`), so killing the group reaches everything it forked
//! unless a descendant deliberately moved to another group. On Windows we
//! ask `taskkill /T` to walk the tree. Both fall back to killing just the
//! direct child.

use tokio::process::Child;
use tracing::{debug, warn};

/// Forcibly terminate `child` and its descendants, then reap it.
///
/// Safe to call on a child that already exited.
pub async fn kill_tree(child: &mut Child) {
    match child.id() {
        Some(pid) => {
            if !kill_group(pid).await {
                if let Err(err) = child.start_kill() {
                    debug!(pid, error = %err, "single-process kill failed; child likely gone");
                }
            }
        }
        None => {
            debug!("child already reaped; nothing to kill");
        }
    }

    if let Err(err) = child.wait().await {
        warn!(error = %err, "failed to reap killed child process");
    }
}

#[cfg(unix)]
async fn kill_group(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };

    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) => {
            debug!(pgid = raw, "sent SIGKILL to process group");
            true
        }
        Err(Errno::ESRCH) => {
            debug!(pgid = raw, "process group already gone");
            true
        }
        Err(err) => {
            warn!(pgid = raw, error = %err, "killpg failed; falling back to single process kill");
            false
        }
    }
}

#[cfg(windows)]
async fn kill_group(pid: u32) -> bool {
    let status = tokio::process::Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid.to_string()])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await;

    match status {
        Ok(s) if s.success() => true,
        Ok(s) => {
            debug!(pid, code = ?s.code(), "taskkill did not succeed; falling back");
            false
        }
        Err(err) => {
            warn!(pid, error = %err, "could not run taskkill; falling back");
            false
        }
    }
}

#[cfg(not(any(unix, windows)))]
async fn kill_group(_pid: u32) -> bool {
    false
}
