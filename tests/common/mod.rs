#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

pub use watchrun_test_utils::init_tracing;

/// Wait until `path` holds a pid written by a child script and return it.
pub async fn read_pid(path: &Path) -> i32 {
    loop {
        if let Ok(text) = std::fs::read_to_string(path) {
            if let Ok(pid) = text.trim().parse::<i32>() {
                return pid;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// True once `pid` no longer runs: it does not exist, or it is a zombie
/// nobody has reaped yet (orphans in containers without an init).
#[cfg(target_os = "linux")]
pub fn process_gone(pid: i32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Err(_) => true,
        Ok(stat) => {
            // Format: "pid (comm) S ..."; comm may contain spaces.
            stat.rsplit_once(')')
                .and_then(|(_, rest)| rest.split_whitespace().next())
                .is_some_and(|state| state == "Z" || state == "X")
        }
    }
}

#[cfg(all(unix, not(target_os = "linux")))]
pub fn process_gone(pid: i32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    matches!(kill(Pid::from_raw(pid), None), Err(Errno::ESRCH))
}

/// Wait up to two seconds for `pid` to disappear.
#[cfg(unix)]
pub async fn wait_until_gone(pid: i32) -> bool {
    for _ in 0..100 {
        if process_gone(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
