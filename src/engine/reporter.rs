// src/engine/reporter.rs

//! User-facing status lines.
//!
//! These are separate from `tracing` logs: status lines are the tool's
//! actual output (one per start, exit, change), while tracing carries
//! diagnostics for `--log-level debug`.

use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::errors::WatchrunError;
use crate::types::{Verbosity, WatchBackendKind};

/// Severity of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusLevel {
    Verbose,
    Info,
    Warning,
    Error,
}

/// Everything the watch loop (and the providers it drives) tells the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    WatchingFiles {
        count: usize,
        backend: WatchBackendKind,
    },
    Started {
        iteration: u64,
        program: String,
        arguments: String,
    },
    Exited {
        iteration: u64,
        code: i32,
    },
    /// The process was killed by us (change or shutdown).
    Stopped {
        iteration: u64,
    },
    LaunchFailed {
        iteration: u64,
        message: String,
    },
    FileChanged {
        path: PathBuf,
    },
    WaitingForChange,
    WatcherGlitch {
        message: String,
    },
    /// A file-set query failed but the loop keeps waiting for a fix.
    ProviderError {
        message: String,
    },
    WaitingForFix,
    /// Output of a failed file-set query, echoed after the error.
    QueryOutput {
        line: String,
    },
    /// A file-set query output line that looks like a diagnostic.
    Diagnostic {
        line: String,
    },
    Fatal {
        message: String,
    },
}

impl StatusEvent {
    pub fn level(&self) -> StatusLevel {
        match self {
            StatusEvent::WatchingFiles { .. } => StatusLevel::Verbose,
            StatusEvent::Started { .. }
            | StatusEvent::Stopped { .. }
            | StatusEvent::FileChanged { .. }
            | StatusEvent::QueryOutput { .. } => StatusLevel::Info,
            StatusEvent::Exited { code, .. } if *code == 0 => StatusLevel::Info,
            StatusEvent::Exited { .. }
            | StatusEvent::WaitingForChange
            | StatusEvent::WatcherGlitch { .. }
            | StatusEvent::WaitingForFix
            | StatusEvent::Diagnostic { .. } => StatusLevel::Warning,
            StatusEvent::LaunchFailed { .. }
            | StatusEvent::ProviderError { .. }
            | StatusEvent::Fatal { .. } => StatusLevel::Error,
        }
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::WatchingFiles { count, backend } => {
                let how = match backend {
                    WatchBackendKind::Native => "native",
                    WatchBackendKind::Polling => "polling",
                };
                write!(f, "Watching {count} file(s) for changes ({how} watcher)")
            }
            StatusEvent::Started { .. } => write!(f, "Started"),
            StatusEvent::Exited { code: 0, .. } => write!(f, "Exited"),
            StatusEvent::Exited { code, .. } => write!(f, "Exited with error code {code}"),
            StatusEvent::Stopped { .. } => write!(f, "Stopped"),
            StatusEvent::LaunchFailed { message, .. } => write!(f, "{message}"),
            StatusEvent::FileChanged { path } => write!(f, "File changed: {}", path.display()),
            StatusEvent::WaitingForChange => {
                write!(f, "Waiting for a file to change before restarting...")
            }
            StatusEvent::WatcherGlitch { message } => {
                write!(f, "File watcher hiccup ({message}); restarting")
            }
            StatusEvent::ProviderError { message } | StatusEvent::Fatal { message } => {
                write!(f, "{message}")
            }
            StatusEvent::WaitingForFix => {
                write!(f, "Fix the error to continue or press Ctrl+C to exit.")
            }
            StatusEvent::QueryOutput { line } => write!(f, "   {line}"),
            StatusEvent::Diagnostic { line } => write!(f, "{line}"),
        }
    }
}

/// Status lines for an error: the message, then any captured query output.
///
/// `fatal` picks between [`StatusEvent::Fatal`] and
/// [`StatusEvent::ProviderError`].
pub fn error_events(err: &WatchrunError, fatal: bool) -> Vec<StatusEvent> {
    let message = err.to_string();
    let mut events = vec![if fatal {
        StatusEvent::Fatal { message }
    } else {
        StatusEvent::ProviderError { message }
    }];

    if let WatchrunError::FileSetQuery { output, .. } = err {
        events.extend(
            output
                .iter()
                .map(|line| StatusEvent::QueryOutput { line: line.clone() }),
        );
    }
    events
}

/// Sink for status events. Implementations must tolerate concurrent calls.
pub trait Reporter: Send + Sync {
    fn report(&self, event: StatusEvent);
}

/// Writes `watchrun: <message>` lines to stderr, filtered by verbosity.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    verbosity: Verbosity,
}

impl ConsoleReporter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn shows(&self, level: StatusLevel) -> bool {
        match self.verbosity {
            Verbosity::Quiet => level >= StatusLevel::Warning,
            Verbosity::Normal => level >= StatusLevel::Info,
            Verbosity::Verbose => true,
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, event: StatusEvent) {
        debug!(?event, "status");

        if !self.shows(event.level()) {
            return;
        }

        // Keep stdout for the child process.
        match &event {
            StatusEvent::Started {
                program, arguments, ..
            } if self.verbosity == Verbosity::Verbose => {
                eprintln!("watchrun: Running {program} with the following arguments: {arguments}");
                eprintln!("watchrun: {event}");
            }
            _ => eprintln!("watchrun: {event}"),
        }
    }
}
