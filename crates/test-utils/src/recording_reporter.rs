use std::sync::Mutex;

use tokio::sync::watch;
use watchrun::engine::{Reporter, StatusEvent};

/// Records every status event so tests can assert on order and wait for
/// specific events.
pub struct RecordingReporter {
    events: Mutex<Vec<StatusEvent>>,
    count: watch::Sender<usize>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            events: Mutex::new(Vec::new()),
            count,
        }
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count<F>(&self, pred: F) -> usize
    where
        F: Fn(&StatusEvent) -> bool,
    {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }

    /// Index of the `nth` (zero-based) event matching `pred`.
    pub fn position<F>(&self, nth: usize, pred: F) -> Option<usize>
    where
        F: Fn(&StatusEvent) -> bool,
    {
        self.events
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .filter(|(_, e)| pred(e))
            .nth(nth)
            .map(|(i, _)| i)
    }

    /// Wait until at least `n` events match `pred`.
    pub async fn wait_for<F>(&self, n: usize, pred: F)
    where
        F: Fn(&StatusEvent) -> bool,
    {
        let mut rx = self.count.subscribe();
        while self.count(&pred) < n {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for RecordingReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: StatusEvent) {
        self.events.lock().unwrap().push(event);
        self.count.send_modify(|c| *c += 1);
    }
}

pub fn is_started(e: &StatusEvent) -> bool {
    matches!(e, StatusEvent::Started { .. })
}

pub fn is_exited(e: &StatusEvent) -> bool {
    matches!(e, StatusEvent::Exited { .. })
}

pub fn is_stopped(e: &StatusEvent) -> bool {
    matches!(e, StatusEvent::Stopped { .. })
}

pub fn is_file_changed(e: &StatusEvent) -> bool {
    matches!(e, StatusEvent::FileChanged { .. })
}

pub fn is_waiting_for_change(e: &StatusEvent) -> bool {
    matches!(e, StatusEvent::WaitingForChange)
}

pub fn is_launch_failed(e: &StatusEvent) -> bool {
    matches!(e, StatusEvent::LaunchFailed { .. })
}

pub fn is_watcher_glitch(e: &StatusEvent) -> bool {
    matches!(e, StatusEvent::WatcherGlitch { .. })
}

/// Any event that means "the iteration's process is gone".
pub fn is_process_end(e: &StatusEvent) -> bool {
    is_exited(e) || is_stopped(e) || is_launch_failed(e)
}
