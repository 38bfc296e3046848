// src/types.rs

/// Which filesystem notification backend a [`FileSetWatcher`] uses.
///
/// [`FileSetWatcher`]: crate::watch::FileSetWatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchBackendKind {
    #[default]
    /// OS change notification (inotify, FSEvents, ReadDirectoryChangesW).
    Native,
    /// Periodically stat every watched file and compare with the last snapshot.
    Polling,
}

impl WatchBackendKind {
    pub fn from_use_polling(use_polling: bool) -> Self {
        if use_polling {
            WatchBackendKind::Polling
        } else {
            WatchBackendKind::Native
        }
    }
}

/// How chatty the status reporter is.
///
/// - `Quiet`: only warnings and errors.
/// - `Normal`: start / exit / change lines.
/// - `Verbose`: additionally the command line and file-set size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

/// Parse a boolean environment toggle such as `WATCHRUN_USE_POLLING`.
///
/// Accepts `1/0`, `true/false`, `yes/no`, `on/off` (case-insensitive).
pub fn parse_bool_flag(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
