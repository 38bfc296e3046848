// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fileset;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, EnvOverrides, Settings};
use crate::engine::{error_events, ConsoleReporter, Reporter, WatchLoop};
use crate::errors::Result;
use crate::fileset::{FileSet, ProjectFileSetProvider, ProjectFinder, WaitOnError};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - project discovery and config loading
/// - settings resolution (CLI, environment, project file)
/// - the file-set provider (optionally wrapped in [`WaitOnError`])
/// - the watch loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let project_path = ProjectFinder::new(&cwd).find(args.project.as_deref())?;
    info!(project = %project_path.display(), "using project file");

    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter::new(args.verbosity()));
    let mut provider = ProjectFileSetProvider::new(&project_path, Arc::clone(&reporter));
    let cancel = CancellationToken::new();

    if args.list {
        let files = match provider.query(&cancel).await {
            Ok(files) => files,
            Err(err) => {
                for event in error_events(&err, true).into_iter().skip(1) {
                    reporter.report(event);
                }
                return Err(err);
            }
        };
        print_file_list(&files);
        return Ok(());
    }

    let project = load_and_validate(&project_path)?;
    let settings = Settings::resolve(&args, &EnvOverrides::from_env(), &project)?;
    let spec = settings.process_spec(&project)?;
    debug!(?settings, "resolved settings");

    // Ctrl-C -> cancel the whole tree of work.
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("shutdown requested");
            cancel.cancel();
        });
    }

    let mut watch_loop = WatchLoop::new(Arc::clone(&reporter), settings.watcher.clone());

    if settings.wait_on_error {
        let mut provider = WaitOnError::new(provider, &project_path, reporter, settings.watcher);
        watch_loop.run(&spec, &mut provider, &cancel).await
    } else {
        watch_loop.run(&spec, &mut provider, &cancel).await
    }
}

fn print_file_list(files: &FileSet) {
    for path in files.sorted() {
        println!("{}", path.display());
    }
}
