// src/engine/core.rs

//! Pure decision logic of the watch loop.
//!
//! Everything here is synchronous and free of Tokio, processes and the
//! filesystem, so the restart policy can be tested in isolation. The async
//! shell in [`super::watch_loop`] performs the IO and asks these functions
//! what to do next.

use crate::engine::reporter::StatusEvent;
use crate::errors::{Result, WatchrunError};

/// Phase of one watch cycle, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    ComputingFileSet,
    Running,
    RestartPending,
    Exiting,
}

/// Which of the three raced signals completed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceWinner {
    ProcessExited,
    FileChanged,
    Cancelled,
}

/// What the loop does once the iteration's process has been torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Stop the loop.
    Exit,
    /// The process finished by itself; do not restart until a file changes.
    AwaitChange,
    /// A file changed while the process ran; go straight to the next cycle.
    Restart,
}

impl NextStep {
    pub fn state(self) -> LoopState {
        match self {
            NextStep::Exit => LoopState::Exiting,
            NextStep::AwaitChange | NextStep::Restart => LoopState::RestartPending,
        }
    }
}

/// Decide how to continue after a race.
///
/// Outer cancellation always wins, even if another signal technically
/// completed first.
pub fn next_step(winner: RaceWinner, outer_cancelled: bool) -> NextStep {
    if outer_cancelled {
        return NextStep::Exit;
    }

    match winner {
        RaceWinner::Cancelled => NextStep::Exit,
        RaceWinner::ProcessExited => NextStep::AwaitChange,
        RaceWinner::FileChanged => NextStep::Restart,
    }
}

/// How the iteration's process ended, as far as the user is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Exited(i32),
    /// Killed by us because of a change or shutdown.
    Killed,
    /// Could not be started, or could not be waited on.
    Failed(String),
}

impl ProcessOutcome {
    pub fn from_result(result: &Result<i32>) -> Self {
        match result {
            Ok(code) => ProcessOutcome::Exited(*code),
            Err(WatchrunError::Cancelled) => ProcessOutcome::Killed,
            Err(err) => ProcessOutcome::Failed(err.to_string()),
        }
    }

    pub fn status_event(&self, iteration: u64) -> StatusEvent {
        match self {
            ProcessOutcome::Exited(code) => StatusEvent::Exited {
                iteration,
                code: *code,
            },
            ProcessOutcome::Killed => StatusEvent::Stopped { iteration },
            ProcessOutcome::Failed(message) => StatusEvent::LaunchFailed {
                iteration,
                message: message.clone(),
            },
        }
    }
}
