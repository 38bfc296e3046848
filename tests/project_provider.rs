// tests/project_provider.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use watchrun::engine::{Reporter, StatusEvent};
use watchrun::errors::WatchrunError;
use watchrun::fileset::{
    collect_matching_files, FileSet, FileSetProvider, PathPatterns, ProjectFileSetProvider,
    ProjectFinder, WaitOnError,
};
use watchrun::fs::mock::MockFileSystem;
use watchrun::watch::WatcherOptions;
use watchrun_test_utils::builders::ProjectFileBuilder;
use watchrun_test_utils::recording_reporter::RecordingReporter;
use watchrun_test_utils::{canonical_dir, sh, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn touch(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, "")
}

fn provider_for(path: &Path) -> (ProjectFileSetProvider, Arc<RecordingReporter>) {
    let reporter = Arc::new(RecordingReporter::new());
    let dyn_reporter: Arc<dyn Reporter> = reporter.clone();
    (ProjectFileSetProvider::new(path, dyn_reporter), reporter)
}

fn set(dir: &Path, rel: &[&str]) -> FileSet {
    rel.iter().map(|r| dir.join(r)).collect()
}

#[tokio::test]
async fn globs_select_files_and_always_include_project_file() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let dir = canonical_dir(tmp.path());
    for rel in ["src/main.rs", "src/util/mod.rs", "target/debug/build.rs", "README.md"] {
        touch(&dir.join(rel))?;
    }
    let project = ProjectFileBuilder::new()
        .include("**/*.rs")
        .exclude("target/**")
        .write_to(&dir)?;

    let (mut provider, _) = provider_for(&project);
    let files = provider.query(&CancellationToken::new()).await?;

    assert_eq!(
        files,
        set(&dir, &["src/main.rs", "src/util/mod.rs", "Watchrun.toml"])
    );
    Ok(())
}

#[tokio::test]
async fn project_file_is_reread_on_every_query() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let dir = canonical_dir(tmp.path());
    touch(&dir.join("a.txt"))?;
    touch(&dir.join("b.txt"))?;

    let project = ProjectFileBuilder::new().include("a.txt").write_to(&dir)?;
    let (mut provider, _) = provider_for(&project);
    let cancel = CancellationToken::new();

    let first = provider.query(&cancel).await?;
    assert!(first.contains(&dir.join("a.txt")));
    assert!(!first.contains(&dir.join("b.txt")));

    ProjectFileBuilder::new().include("b.txt").write_to(&dir)?;
    let second = provider.query(&cancel).await?;
    assert!(!second.contains(&dir.join("a.txt")));
    assert!(second.contains(&dir.join("b.txt")));
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn list_command_output_becomes_the_file_set() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let dir = canonical_dir(tmp.path());
    let project = ProjectFileBuilder::new()
        .list_cmd(sh(
            "echo a.txt; echo; echo '  sub/b.txt  '; echo 'note: error in generated code' 1>&2",
        ))
        .write_to(&dir)?;

    let (mut provider, reporter) = provider_for(&project);
    let files = with_timeout(provider.query(&CancellationToken::new())).await?;

    assert_eq!(files, set(&dir, &["a.txt", "sub/b.txt", "Watchrun.toml"]));
    assert_eq!(
        reporter.events(),
        vec![StatusEvent::Diagnostic {
            line: "note: error in generated code".to_string()
        }]
    );
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn custom_diagnostic_pattern_is_used() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let dir = canonical_dir(tmp.path());
    let project = ProjectFileBuilder::new()
        .list_cmd(sh("echo 'error: ignored'; echo 'WARN-42 flaky input' 1>&2"))
        .diagnostic_pattern(r"^WARN-\d+")
        .write_to(&dir)?;

    let (mut provider, reporter) = provider_for(&project);
    with_timeout(provider.query(&CancellationToken::new())).await?;

    assert_eq!(
        reporter.events(),
        vec![StatusEvent::Diagnostic {
            line: "WARN-42 flaky input".to_string()
        }]
    );
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn failing_list_command_returns_its_output() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let dir = canonical_dir(tmp.path());
    let project = ProjectFileBuilder::new()
        .list_cmd(sh("echo 'Build FAILED'; echo 'missing reference' 1>&2; exit 3"))
        .write_to(&dir)?;

    let (mut provider, _) = provider_for(&project);
    match with_timeout(provider.query(&CancellationToken::new())).await {
        Err(WatchrunError::FileSetQuery {
            project: failed,
            code,
            output,
        }) => {
            assert_eq!(failed, project);
            assert_eq!(code, 3);
            assert!(output.contains(&"Build FAILED".to_string()));
            assert!(output.contains(&"missing reference".to_string()));
        }
        other => panic!("expected FileSetQuery error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn invalid_project_file_is_a_config_error() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let dir = canonical_dir(tmp.path());
    // Neither include patterns nor list_cmd.
    let project = ProjectFileBuilder::new().write_to(&dir)?;

    let (mut provider, _) = provider_for(&project);
    let result = provider.query(&CancellationToken::new()).await;

    assert!(matches!(result, Err(WatchrunError::ConfigError(_))), "{result:?}");
    Ok(())
}

#[test]
fn walk_prunes_excluded_directories() -> TestResult {
    let fs = MockFileSystem::new();
    for rel in [
        "src/main.rs",
        "src/gen/out.rs",
        "node_modules/pkg/index.rs",
        "docs/readme.md",
    ] {
        fs.add_file(Path::new("/repo").join(rel), "x");
    }
    let patterns = PathPatterns::new(
        &["**/*.rs".to_string()],
        &["node_modules".to_string(), "src/gen/**".to_string()],
    )?;

    let files = collect_matching_files(&fs, Path::new("/repo"), &patterns)?;

    assert_eq!(files, vec![PathBuf::from("/repo/src/main.rs")]);
    Ok(())
}

#[test]
fn finder_ignores_unrelated_toml_files() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/repo/Cargo.toml", "");
    fs.add_file("/repo/watchrun.toml.bak", "");
    fs.add_file("/repo/tools/Watchrun.toml", "");

    let finder = ProjectFinder::with_fs("/repo", Arc::new(fs));
    assert!(matches!(finder.find(None), Err(WatchrunError::NoProjectFound(_))));
    assert_eq!(
        finder.find(Some(Path::new("tools")))?,
        PathBuf::from("/repo/tools/Watchrun.toml")
    );
    Ok(())
}

#[test]
fn finder_locates_single_project_file() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let dir = tmp.path().to_path_buf();
    let expected = ProjectFileBuilder::new().include("*").write_as(&dir, "api.watchrun.toml")?;
    touch(&dir.join("Cargo.toml"))?;

    let finder = ProjectFinder::new(&dir);
    assert_eq!(finder.find(None)?, expected);
    assert_eq!(finder.find(Some(Path::new("api.watchrun.toml")))?, expected);
    Ok(())
}

#[test]
fn finder_reports_missing_and_ambiguous_projects() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let dir = tmp.path().to_path_buf();
    let finder = ProjectFinder::new(&dir);

    assert!(matches!(finder.find(None), Err(WatchrunError::NoProjectFound(p)) if p == dir));

    ProjectFileBuilder::new().include("*").write_to(&dir)?;
    ProjectFileBuilder::new().include("*").write_as(&dir, "web.watchrun.toml")?;
    assert!(matches!(
        finder.find(None),
        Err(WatchrunError::MultipleProjectsFound(_))
    ));

    let missing = PathBuf::from("nope/Watchrun.toml");
    match finder.find(Some(missing.as_path())) {
        Err(WatchrunError::ProjectPathNotFound(p)) => assert_eq!(p, dir.join(&missing)),
        other => panic!("expected ProjectPathNotFound, got {other:?}"),
    }
    Ok(())
}

#[test]
fn finder_searches_an_explicit_directory() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let sub = tmp.path().join("service");
    fs::create_dir_all(&sub)?;
    let expected = ProjectFileBuilder::new().include("*").write_to(&sub)?;

    let finder = ProjectFinder::new(tmp.path());
    assert_eq!(finder.find(Some(Path::new("service")))?, expected);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn wait_on_error_retries_after_project_file_changes() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let dir = canonical_dir(tmp.path());
    touch(&dir.join("main.txt"))?;
    let project = ProjectFileBuilder::new()
        .list_cmd(sh("echo 'error: broken'; exit 1"))
        .write_to(&dir)?;

    let reporter = Arc::new(RecordingReporter::new());
    let dyn_reporter: Arc<dyn Reporter> = reporter.clone();
    let inner = ProjectFileSetProvider::new(&project, dyn_reporter.clone());
    let options = WatcherOptions {
        debounce: Duration::from_millis(50),
        ..WatcherOptions::default()
    };
    let mut provider = WaitOnError::new(inner, &project, dyn_reporter, options);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(async move { provider.create(&cancel).await });

    with_timeout(reporter.wait_for(1, |e| matches!(e, StatusEvent::WaitingForFix))).await;
    assert!(!handle.is_finished());
    assert_eq!(
        reporter.count(|e| matches!(e, StatusEvent::ProviderError { .. })),
        1
    );
    assert!(reporter.events().contains(&StatusEvent::QueryOutput {
        line: "error: broken".to_string()
    }));

    ProjectFileBuilder::new().include("main.txt").write_to(&dir)?;
    let files = with_timeout(handle).await??;

    assert_eq!(files, set(&dir, &["main.txt", "Watchrun.toml"]));
    assert!(reporter.events().contains(&StatusEvent::FileChanged {
        path: project.clone()
    }));
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn wait_on_error_stops_waiting_when_cancelled() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let dir = canonical_dir(tmp.path());
    let project = ProjectFileBuilder::new()
        .list_cmd(sh("exit 1"))
        .write_to(&dir)?;

    let reporter = Arc::new(RecordingReporter::new());
    let dyn_reporter: Arc<dyn Reporter> = reporter.clone();
    let inner = ProjectFileSetProvider::new(&project, dyn_reporter.clone());
    let mut provider = WaitOnError::new(inner, &project, dyn_reporter, WatcherOptions::default());
    let cancel = CancellationToken::new();

    let task_cancel = cancel.clone();
    let handle = tokio::spawn(async move { provider.create(&task_cancel).await });

    with_timeout(reporter.wait_for(1, |e| matches!(e, StatusEvent::WaitingForFix))).await;
    cancel.cancel();

    let result = with_timeout(handle).await?;
    assert!(matches!(result, Err(WatchrunError::Cancelled)));
    Ok(())
}
