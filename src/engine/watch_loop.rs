// src/engine/watch_loop.rs

//! Async shell of the watch loop.
//!
//! One iteration:
//! 1. ask the provider for the current file set,
//! 2. start watching it,
//! 3. start the process,
//! 4. race process exit, file change and cancellation,
//! 5. tear down whatever lost (kill the process tree, drop the watcher),
//! 6. report, and if the process finished on its own, wait for a change.
//!
//! Per-iteration resources live in [`RunState`]; dropping it cancels the
//! iteration scope, so nothing started in an iteration outlives it.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::core::{next_step, LoopState, NextStep, ProcessOutcome, RaceWinner};
use crate::engine::reporter::{error_events, Reporter, StatusEvent};
use crate::engine::{ITERATION_ENV, WATCHRUN_ENV};
use crate::errors::{Result, WatchrunError};
use crate::exec::{ProcessRunner, ProcessSpec};
use crate::fileset::FileSetProvider;
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::{FileSetWatcher, WatcherOptions};

/// Resources owned by a single iteration.
struct RunState {
    iteration: u64,
    watcher: FileSetWatcher,
    /// Child of the loop's token; cancelled when the iteration ends.
    cancel: CancellationToken,
}

impl Drop for RunState {
    fn drop(&mut self) {
        self.cancel.cancel();
        debug!(iteration = self.iteration, "iteration resources released");
    }
}

pub struct WatchLoop {
    reporter: Arc<dyn Reporter>,
    options: WatcherOptions,
    /// What polling watchers stat.
    fs: Arc<dyn FileSystem>,
    runner: ProcessRunner,
    iteration: u64,
}

impl WatchLoop {
    pub fn new(reporter: Arc<dyn Reporter>, options: WatcherOptions) -> Self {
        Self::with_fs(reporter, options, Arc::new(RealFileSystem))
    }

    pub fn with_fs(
        reporter: Arc<dyn Reporter>,
        options: WatcherOptions,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            reporter,
            options,
            fs,
            runner: ProcessRunner::new(),
            iteration: 0,
        }
    }

    /// Iterations started so far.
    pub fn iterations(&self) -> u64 {
        self.iteration
    }

    /// Run `spec` until `cancel` fires, restarting it whenever a file from
    /// the provider's set changes.
    ///
    /// Returns `Ok(())` on cancellation. A provider failure is reported and
    /// returned; by then no process of this loop is running.
    pub async fn run<P>(
        &mut self,
        spec: &ProcessSpec,
        provider: &mut P,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        P: FileSetProvider + ?Sized,
    {
        info!(program = %spec.short_display_name(), "watch loop started");

        loop {
            match self.run_iteration(spec, provider, cancel).await? {
                NextStep::Exit => break,
                NextStep::AwaitChange | NextStep::Restart => continue,
            }
        }

        debug!(state = ?LoopState::Exiting, iterations = self.iteration, "watch loop finished");
        Ok(())
    }

    async fn run_iteration<P>(
        &mut self,
        spec: &ProcessSpec,
        provider: &mut P,
        cancel: &CancellationToken,
    ) -> Result<NextStep>
    where
        P: FileSetProvider + ?Sized,
    {
        if cancel.is_cancelled() {
            return Ok(NextStep::Exit);
        }

        debug!(state = ?LoopState::ComputingFileSet, "watch loop state");

        let files = match provider.create(cancel).await {
            Ok(files) => files,
            Err(err) if err.is_cancelled() => return Ok(NextStep::Exit),
            Err(err) => {
                for event in error_events(&err, true) {
                    self.reporter.report(event);
                }
                return Err(err);
            }
        };

        if cancel.is_cancelled() {
            return Ok(NextStep::Exit);
        }

        let watcher = match FileSetWatcher::with_fs(files, &self.options, Arc::clone(&self.fs)) {
            Ok(watcher) => watcher,
            Err(err) => {
                self.reporter.report(StatusEvent::Fatal {
                    message: err.to_string(),
                });
                return Err(err);
            }
        };

        self.reporter.report(StatusEvent::WatchingFiles {
            count: watcher.files().len(),
            backend: watcher.backend_kind(),
        });

        self.iteration += 1;
        let iteration = self.iteration;
        let mut state = RunState {
            iteration,
            watcher,
            cancel: cancel.child_token(),
        };

        let iteration_spec = spec
            .clone()
            .with_env(WATCHRUN_ENV, "1")
            .with_env(ITERATION_ENV, iteration.to_string());

        debug!(state = ?LoopState::Running, iteration, "watch loop state");
        self.reporter.report(StatusEvent::Started {
            iteration,
            program: spec.short_display_name(),
            arguments: spec.display_arguments(),
        });

        let (winner, change, result) = {
            let process = self.runner.run(&iteration_spec, &state.cancel);
            tokio::pin!(process);

            let (winner, change, finished) = tokio::select! {
                biased;
                _ = cancel.cancelled() => (RaceWinner::Cancelled, None, None),
                result = &mut process => (RaceWinner::ProcessExited, None, Some(result)),
                change = state.watcher.changed_file(&state.cancel) => {
                    (RaceWinner::FileChanged, Some(change), None)
                }
            };

            debug!(iteration, ?winner, "race settled");

            // Stop the loser(s) and wait for the process to be gone before
            // reporting anything.
            state.cancel.cancel();
            let result = match finished {
                Some(result) => result,
                None => process.await,
            };
            (winner, change, result)
        };

        let outcome = ProcessOutcome::from_result(&result);
        if let ProcessOutcome::Failed(message) = &outcome {
            warn!(iteration, error = %message, "process could not be run");
        }
        self.reporter.report(outcome.status_event(iteration));

        let step = next_step(winner, cancel.is_cancelled());
        debug!(state = ?step.state(), iteration, ?step, "watch loop state");

        match step {
            NextStep::Exit => Ok(NextStep::Exit),
            NextStep::Restart => {
                match change {
                    Some(Ok(path)) => self.reporter.report(StatusEvent::FileChanged { path }),
                    Some(Err(err)) => self.report_watcher_glitch(&err),
                    None => {}
                }
                Ok(NextStep::Restart)
            }
            NextStep::AwaitChange => {
                self.reporter.report(StatusEvent::WaitingForChange);

                match state.watcher.changed_file(cancel).await {
                    Ok(path) => {
                        self.reporter.report(StatusEvent::FileChanged { path });
                        Ok(NextStep::AwaitChange)
                    }
                    Err(WatchrunError::Cancelled) => Ok(NextStep::Exit),
                    Err(err) => {
                        self.report_watcher_glitch(&err);
                        Ok(NextStep::AwaitChange)
                    }
                }
            }
        }
    }

    fn report_watcher_glitch(&self, err: &WatchrunError) {
        warn!(error = %err, "watcher failed; treating as a change");
        self.reporter.report(StatusEvent::WatcherGlitch {
            message: err.to_string(),
        });
    }
}
