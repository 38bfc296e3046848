// src/exec/runner.rs

//! Single-process runner.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{Result, WatchrunError};
use crate::exec::kill::kill_tree;
use crate::exec::output::{OutputLine, OutputSink, OutputStream};
use crate::exec::spec::ProcessSpec;

/// How long to keep draining captured pipes after the child exited.
///
/// A grandchild that inherited the pipes can keep them open forever; we stop
/// waiting for it after this long.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Starts one child process at a time and reports its exit code.
///
/// `run` takes `&mut self`, so a runner can never track two processes at
/// once; callers that need concurrency own several runners.
#[derive(Debug, Default)]
pub struct ProcessRunner {
    launched: u64,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of processes this runner has started so far.
    pub fn launched(&self) -> u64 {
        self.launched
    }

    /// Run `spec` to completion.
    ///
    /// The child never gets a terminal stdin; without an output sink it
    /// still inherits stdout and stderr.
    ///
    /// - Returns the exit code when the process exits on its own.
    /// - Returns [`WatchrunError::Launch`] if the executable cannot be started.
    /// - If `cancel` fires first, the whole process tree is killed and reaped,
    ///   then [`WatchrunError::Cancelled`] is returned.
    pub async fn run(&mut self, spec: &ProcessSpec, cancel: &CancellationToken) -> Result<i32> {
        if cancel.is_cancelled() {
            return Err(WatchrunError::Cancelled);
        }

        let mut cmd = Command::new(&spec.executable);
        cmd.args(&spec.arguments)
            .current_dir(&spec.working_directory)
            .envs(&spec.environment)
            .kill_on_drop(true);

        // The child leads its own process group, which is not the terminal's
        // foreground group; reading an inherited stdin would stop it with
        // SIGTTIN.
        #[cfg(unix)]
        cmd.process_group(0);
        cmd.stdin(Stdio::null());

        if spec.output.is_some() {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        let mut child = cmd.spawn().map_err(|source| WatchrunError::Launch {
            program: spec.executable.clone(),
            source,
        })?;
        self.launched += 1;

        let pid = child.id();
        info!(
            pid = ?pid,
            program = %spec.executable,
            args = %spec.display_arguments(),
            cwd = ?spec.working_directory,
            "started process"
        );

        let mut pumps = Vec::new();
        if let Some(sink) = &spec.output {
            if let Some(stdout) = child.stdout.take() {
                pumps.push(spawn_pump(stdout, OutputStream::Stdout, Arc::clone(sink)));
            }
            if let Some(stderr) = child.stderr.take() {
                pumps.push(spawn_pump(stderr, OutputStream::Stderr, Arc::clone(sink)));
            }
        }

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                drain_pumps(pumps).await;
                let code = exit_code(status);
                info!(pid = ?pid, exit_code = code, "process exited");
                Ok(code)
            }
            _ = cancel.cancelled() => {
                info!(pid = ?pid, "cancellation requested; killing process tree");
                kill_tree(&mut child).await;
                for pump in pumps {
                    pump.abort();
                }
                debug!(pid = ?pid, "killed process reaped");
                Err(WatchrunError::Cancelled)
            }
        }
    }
}

fn spawn_pump<R>(reader: R, stream: OutputStream, sink: Arc<dyn OutputSink>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(text)) => sink.write_line(OutputLine { stream, text }),
                Ok(None) => break,
                Err(err) => {
                    debug!(?stream, error = %err, "output pump stopped on read error");
                    break;
                }
            }
        }
    })
}

async fn drain_pumps(pumps: Vec<JoinHandle<()>>) {
    for mut pump in pumps {
        match tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, &mut pump).await {
            Ok(_) => {}
            Err(_) => {
                warn!("output pipe still open after process exit; detaching");
                pump.abort();
            }
        }
    }
}

/// Exit code of a finished process. Signal deaths on Unix map to
/// `128 + signal`, as shells report them.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }

    -1
}
