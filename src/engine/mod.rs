// src/engine/mod.rs

//! The watch loop: compute files, run, race, tear down, repeat.
//!
//! The pure restart policy lives in [`core`]; the async shell that runs
//! processes and watchers is [`watch_loop`]. [`reporter`] defines the status
//! lines both of them produce.

/// Set to `1` in the environment of every process the loop starts.
pub const WATCHRUN_ENV: &str = "WATCHRUN";

/// One-based iteration number of the current run.
pub const ITERATION_ENV: &str = "WATCHRUN_ITERATION";

pub mod core;
pub mod reporter;
pub mod watch_loop;

pub use core::{next_step, LoopState, NextStep, ProcessOutcome, RaceWinner};
pub use reporter::{error_events, ConsoleReporter, Reporter, StatusEvent, StatusLevel};
pub use watch_loop::WatchLoop;
