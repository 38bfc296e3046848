// src/exec/spec.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::output::OutputSink;

/// Immutable description of a child process.
///
/// The watch loop never mutates a spec it was given; per-iteration
/// environment additions go through [`ProcessSpec::with_env`], which returns
/// a new value.
#[derive(Clone)]
pub struct ProcessSpec {
    pub executable: String,
    pub arguments: Vec<String>,
    pub working_directory: PathBuf,
    pub environment: BTreeMap<String, String>,
    /// When set, stdout and stderr are piped and streamed line by line into
    /// this sink instead of being inherited from the parent.
    pub output: Option<Arc<dyn OutputSink>>,
}

impl ProcessSpec {
    pub fn new(executable: impl Into<String>, working_directory: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            arguments: Vec::new(),
            working_directory: working_directory.into(),
            environment: BTreeMap::new(),
            output: None,
        }
    }

    /// Build a spec from a full command line (`["cargo", "run"]`).
    ///
    /// Returns `None` when the command line is empty.
    pub fn from_command_line(
        command: &[String],
        working_directory: impl Into<PathBuf>,
    ) -> Option<Self> {
        let (executable, rest) = command.split_first()?;
        Some(Self::new(executable.clone(), working_directory).args(rest.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn with_output(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.output = Some(sink);
        self
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Executable file name without its directory, for status lines.
    pub fn short_display_name(&self) -> String {
        Path::new(&self.executable)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.executable.clone())
    }

    /// Arguments joined for display, quoting the ones containing whitespace.
    pub fn display_arguments(&self) -> String {
        self.arguments
            .iter()
            .map(|a| {
                if a.is_empty() || a.chars().any(char::is_whitespace) || a.contains('"') {
                    format!("\"{}\"", a.replace('"', "\\\""))
                } else {
                    a.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessSpec")
            .field("executable", &self.executable)
            .field("arguments", &self.arguments)
            .field("working_directory", &self.working_directory)
            .field("environment", &self.environment)
            .field("captures_output", &self.output.is_some())
            .finish()
    }
}
