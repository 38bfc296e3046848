// src/exec/output.rs

//! Output capture for child processes.
//!
//! The runner spawns one pumping task per captured stream; both write into
//! the same sink concurrently, so sinks must be `Send + Sync` and treat
//! every call as an append.

use std::fmt;
use std::sync::Mutex;

use tokio::sync::mpsc;

/// Which pipe a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub text: String,
}

/// Append-only, thread-safe destination for captured lines.
pub trait OutputSink: Send + Sync {
    fn write_line(&self, line: OutputLine);
}

/// Sink that keeps every line in memory.
#[derive(Default)]
pub struct CapturedOutput {
    lines: Mutex<Vec<OutputLine>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<OutputLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Only the text of each line, in arrival order.
    pub fn texts(&self) -> Vec<String> {
        self.lines().into_iter().map(|l| l.text).collect()
    }

    /// Text of the lines that came from stdout.
    pub fn stdout_texts(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.stream == OutputStream::Stdout)
            .map(|l| l.text)
            .collect()
    }
}

impl OutputSink for CapturedOutput {
    fn write_line(&self, line: OutputLine) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

impl fmt::Debug for CapturedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedOutput").finish_non_exhaustive()
    }
}

/// Sink that forwards each line into an unbounded channel.
///
/// The receiving side sees the end of the stream once the sink (and every
/// spec holding it) has been dropped.
pub struct ChannelOutput {
    tx: mpsc::UnboundedSender<OutputLine>,
}

impl ChannelOutput {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutputLine>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl OutputSink for ChannelOutput {
    fn write_line(&self, line: OutputLine) {
        // The receiver may have gone away; captured output is best-effort.
        let _ = self.tx.send(line);
    }
}
