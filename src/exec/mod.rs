// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for running the user's command (and the
//! optional file-list command of a project) with `tokio::process::Command`.
//!
//! - [`spec`] holds the immutable [`ProcessSpec`].
//! - [`output`] defines the line sinks used to capture stdout/stderr.
//! - [`runner`] owns [`ProcessRunner`], which starts one process at a time
//!   and kills it on cancellation.
//! - [`kill`] implements process-tree termination per platform.

pub mod kill;
pub mod output;
pub mod runner;
pub mod spec;

pub use output::{CapturedOutput, ChannelOutput, OutputLine, OutputSink, OutputStream};
pub use runner::ProcessRunner;
pub use spec::ProcessSpec;
