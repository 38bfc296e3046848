// tests/watch_loop.rs
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, read_pid, wait_until_gone};

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use watchrun::engine::{Reporter, StatusEvent, WatchLoop};
use watchrun::errors::{Result as WatchrunResult, WatchrunError};
use watchrun::exec::ProcessSpec;
use watchrun::fileset::FileSet;
use watchrun::fs::mock::MockFileSystem;
use watchrun::types::WatchBackendKind;
use watchrun::watch::WatcherOptions;
use watchrun_test_utils::fake_provider::ScriptedFileSetProvider;
use watchrun_test_utils::flaky_fs::FlakyFileSystem;
use watchrun_test_utils::recording_reporter::{
    is_exited, is_file_changed, is_launch_failed, is_process_end, is_started, is_stopped,
    is_waiting_for_change, is_watcher_glitch, RecordingReporter,
};
use watchrun_test_utils::{canonical_dir, sh, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn options() -> WatcherOptions {
    WatcherOptions {
        debounce: Duration::from_millis(50),
        ..WatcherOptions::default()
    }
}

fn shell(script: &str, dir: &Path) -> ProcessSpec {
    ProcessSpec::from_command_line(&sh(script), dir).expect("non-empty command")
}

/// Start a loop in the background.
fn spawn_loop(
    spec: ProcessSpec,
    mut provider: ScriptedFileSetProvider,
    reporter: Arc<RecordingReporter>,
    cancel: CancellationToken,
) -> JoinHandle<WatchrunResult<()>> {
    tokio::spawn(async move {
        let reporter: Arc<dyn Reporter> = reporter;
        let mut watch_loop = WatchLoop::new(reporter, options());
        watch_loop.run(&spec, &mut provider, &cancel).await
    })
}

struct Project {
    _tmp: tempfile::TempDir,
    dir: PathBuf,
    watched: PathBuf,
}

fn project() -> std::io::Result<Project> {
    let tmp = tempfile::tempdir()?;
    let dir = canonical_dir(tmp.path());
    let watched = dir.join("app.src");
    std::fs::write(&watched, "v1")?;
    Ok(Project {
        _tmp: tmp,
        dir,
        watched,
    })
}

#[tokio::test]
async fn finished_process_waits_for_change_then_restarts() -> TestResult {
    init_tracing();
    let p = project()?;
    let reporter = Arc::new(RecordingReporter::new());
    let cancel = CancellationToken::new();
    let spec = shell("echo \"$WATCHRUN:$WATCHRUN_ITERATION\" >> runs.log", &p.dir);
    let provider = ScriptedFileSetProvider::always(FileSet::new([p.watched.clone()]));

    let handle = spawn_loop(spec, provider, reporter.clone(), cancel.clone());

    with_timeout(reporter.wait_for(1, is_waiting_for_change)).await;
    assert_eq!(reporter.count(is_started), 1);

    std::fs::write(&p.watched, "v2")?;
    with_timeout(reporter.wait_for(2, is_waiting_for_change)).await;

    cancel.cancel();
    with_timeout(handle).await??;

    let runs = std::fs::read_to_string(p.dir.join("runs.log"))?;
    assert_eq!(runs.lines().collect::<Vec<_>>(), vec!["1:1", "1:2"]);
    assert_eq!(reporter.count(is_exited), 2);
    assert_eq!(reporter.count(is_file_changed), 1);
    Ok(())
}

#[tokio::test]
async fn change_restarts_long_running_process_without_overlap() -> TestResult {
    init_tracing();
    let p = project()?;
    let reporter = Arc::new(RecordingReporter::new());
    let cancel = CancellationToken::new();
    let spec = shell("echo $$ > pid.$WATCHRUN_ITERATION; exec sleep 30", &p.dir);
    let provider = ScriptedFileSetProvider::always(FileSet::new([p.watched.clone()]));

    let handle = spawn_loop(spec, provider, reporter.clone(), cancel.clone());

    let first = with_timeout(read_pid(&p.dir.join("pid.1"))).await;
    std::fs::write(&p.watched, "v2")?;

    let second = with_timeout(read_pid(&p.dir.join("pid.2"))).await;
    assert_ne!(first, second);
    assert!(wait_until_gone(first).await, "first server still running");

    cancel.cancel();
    with_timeout(handle).await??;
    assert!(wait_until_gone(second).await, "second server still running");

    // Started / ended strictly alternate.
    let events = reporter.events();
    let lifecycle: Vec<&StatusEvent> = events
        .iter()
        .filter(|e| is_started(e) || is_process_end(e))
        .collect();
    assert_eq!(lifecycle.len(), 4, "events: {events:?}");
    for (i, event) in lifecycle.iter().enumerate() {
        if i % 2 == 0 {
            assert!(is_started(event), "expected Started at {i}: {events:?}");
        } else {
            assert!(is_stopped(event), "expected Stopped at {i}: {events:?}");
        }
    }

    // The change is reported after the old process is gone and before the
    // new one starts.
    let stopped = reporter.position(0, is_stopped).expect("stopped");
    let changed = reporter.position(0, is_file_changed).expect("changed");
    let restarted = reporter.position(1, is_started).expect("restarted");
    assert!(stopped < changed && changed < restarted, "events: {events:?}");
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_is_reported_and_not_restarted() -> TestResult {
    init_tracing();
    let p = project()?;
    let reporter = Arc::new(RecordingReporter::new());
    let cancel = CancellationToken::new();
    let provider = ScriptedFileSetProvider::always(FileSet::new([p.watched.clone()]));

    let handle = spawn_loop(shell("exit 2", &p.dir), provider, reporter.clone(), cancel.clone());

    with_timeout(reporter.wait_for(1, is_waiting_for_change)).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(reporter
        .events()
        .contains(&StatusEvent::Exited { iteration: 1, code: 2 }));
    assert_eq!(reporter.count(is_started), 1);

    cancel.cancel();
    with_timeout(handle).await??;
    Ok(())
}

#[tokio::test]
async fn launch_failure_keeps_the_loop_alive() -> TestResult {
    init_tracing();
    let p = project()?;
    let reporter = Arc::new(RecordingReporter::new());
    let cancel = CancellationToken::new();
    let provider = ScriptedFileSetProvider::always(FileSet::new([p.watched.clone()]));
    let spec = ProcessSpec::new("/definitely/not/a/real/program", &p.dir);

    let handle = spawn_loop(spec, provider, reporter.clone(), cancel.clone());

    with_timeout(reporter.wait_for(1, is_waiting_for_change)).await;
    assert_eq!(reporter.count(is_launch_failed), 1);

    std::fs::write(&p.watched, "v2")?;
    with_timeout(reporter.wait_for(2, is_launch_failed)).await;

    cancel.cancel();
    with_timeout(handle).await??;
    Ok(())
}

#[tokio::test]
async fn provider_failure_is_fatal_and_starts_nothing() -> TestResult {
    init_tracing();
    let p = project()?;
    let reporter = Arc::new(RecordingReporter::new());
    let cancel = CancellationToken::new();
    let provider = ScriptedFileSetProvider::new()
        .then_err(WatchrunError::ConfigError("broken project".to_string()));
    let calls = provider.calls();

    let handle = spawn_loop(shell("exit 0", &p.dir), provider, reporter.clone(), cancel.clone());
    let result = with_timeout(handle).await?;

    match result {
        Err(WatchrunError::ConfigError(msg)) => assert_eq!(msg, "broken project"),
        other => panic!("expected ConfigError, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(reporter.count(is_started), 0);
    assert_eq!(reporter.count(|e| matches!(e, StatusEvent::Fatal { .. })), 1);
    Ok(())
}

#[tokio::test]
async fn file_set_is_recomputed_every_iteration() -> TestResult {
    init_tracing();
    let p = project()?;
    let other = p.dir.join("other.src");
    std::fs::write(&other, "v1")?;
    let reporter = Arc::new(RecordingReporter::new());
    let cancel = CancellationToken::new();
    // First cycle watches only `app.src`, later cycles only `other.src`.
    let provider = ScriptedFileSetProvider::new()
        .then_ok(FileSet::new([p.watched.clone()]))
        .then_always(FileSet::new([other.clone()]));
    let calls = provider.calls();

    let handle = spawn_loop(shell("exit 0", &p.dir), provider, reporter.clone(), cancel.clone());

    with_timeout(reporter.wait_for(1, is_waiting_for_change)).await;
    std::fs::write(&p.watched, "v2")?;
    with_timeout(reporter.wait_for(2, is_waiting_for_change)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    std::fs::write(&other, "v2")?;
    with_timeout(reporter.wait_for(3, is_waiting_for_change)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    cancel.cancel();
    with_timeout(handle).await??;
    assert!(reporter.events().contains(&StatusEvent::FileChanged { path: other }));
    Ok(())
}

#[tokio::test]
async fn cancellation_kills_process_before_returning() -> TestResult {
    init_tracing();
    let p = project()?;
    let reporter = Arc::new(RecordingReporter::new());
    let cancel = CancellationToken::new();
    let provider = ScriptedFileSetProvider::always(FileSet::new([p.watched.clone()]));
    let spec = shell("echo $$ > pid; exec sleep 30", &p.dir);

    let handle = spawn_loop(spec, provider, reporter.clone(), cancel.clone());

    let pid = with_timeout(read_pid(&p.dir.join("pid"))).await;
    cancel.cancel();
    with_timeout(handle).await??;

    assert!(common::process_gone(pid), "process {pid} outlived the loop");
    assert_eq!(reporter.count(is_stopped), 1);
    Ok(())
}

#[tokio::test]
async fn cancellation_during_file_set_query_returns_cleanly() -> TestResult {
    init_tracing();
    let p = project()?;
    let reporter = Arc::new(RecordingReporter::new());
    let cancel = CancellationToken::new();
    // No script and no fallback: the query blocks until cancelled.
    let provider = ScriptedFileSetProvider::new();

    let handle = spawn_loop(shell("exit 0", &p.dir), provider, reporter.clone(), cancel.clone());
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    with_timeout(handle).await??;
    assert!(reporter.events().is_empty());
    Ok(())
}

#[tokio::test]
async fn watcher_failure_is_reported_and_restarts_the_process() -> TestResult {
    init_tracing();
    let p = project()?;
    let mock = MockFileSystem::new();
    let watched = PathBuf::from("/share/app.src");
    mock.add_file(&watched, "v1");
    let fs = FlakyFileSystem::new(mock);

    let reporter = Arc::new(RecordingReporter::new());
    let cancel = CancellationToken::new();
    let provider = ScriptedFileSetProvider::always(FileSet::new([watched]));
    let spec = shell("exec sleep 30", &p.dir);
    let options = WatcherOptions {
        backend: WatchBackendKind::Polling,
        poll_interval: Duration::from_millis(20),
        ..options()
    };

    let handle = {
        let reporter: Arc<dyn Reporter> = reporter.clone();
        let fs = Arc::new(fs.clone());
        let cancel = cancel.clone();
        let mut provider = provider;
        tokio::spawn(async move {
            let mut watch_loop = WatchLoop::with_fs(reporter, options, fs);
            watch_loop.run(&spec, &mut provider, &cancel).await
        })
    };

    with_timeout(reporter.wait_for(1, is_started)).await;
    fs.fail_next(1);
    with_timeout(reporter.wait_for(2, is_started)).await;

    cancel.cancel();
    with_timeout(handle).await??;

    let events = reporter.events();
    assert_eq!(reporter.count(is_watcher_glitch), 1, "events: {events:?}");
    assert_eq!(reporter.count(is_file_changed), 0, "events: {events:?}");

    // Old process gone, glitch reported, then the rerun.
    let stopped = reporter.position(0, is_stopped).expect("stopped");
    let glitch = reporter.position(0, is_watcher_glitch).expect("glitch");
    let restarted = reporter.position(1, is_started).expect("restarted");
    assert!(stopped < glitch && glitch < restarted, "events: {events:?}");
    Ok(())
}
