//! par-walker - Parallel Directory Walker
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use par_walker::config::{CliArgs, WalkConfig};
use par_walker::executor::Executor;
use par_walker::progress::{print_detached, print_header, print_summary, ProgressReporter};
use par_walker::walker::{FsHierarchy, ParallelWalker, WalkActions};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = WalkConfig::from_args(args).context("Invalid configuration")?;

    // Listing and the spinner would fight over the terminal
    let show_progress = config.show_progress && !config.list;

    if show_progress {
        print_header(&config);
    }

    let hierarchy = FsHierarchy::new()
        .with_excludes(config.exclude_patterns.clone())
        .follow_symlinks(config.follow_symlinks);

    let executor = Executor::new(config.worker_count, config.backend)
        .context("Invalid configuration")?
        .with_safe_mode(config.safe_mode);

    let walker = ParallelWalker::new(hierarchy, executor)
        .max_depth(config.max_depth)
        .mode(config.mode)
        .poll_interval(config.poll_interval);

    // Setup signal handler for graceful shutdown
    let shutdown_flag = walker.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let actions = if config.list {
        WalkActions::new().on_leaf(|_, path: &PathBuf| {
            // Lock per line so concurrent workers do not interleave output
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{}", path.display());
        })
    } else {
        WalkActions::new()
    };

    let handle = walker
        .start(config.root.clone(), actions)
        .context("Failed to start walk")?;

    if !config.safe_mode {
        let snapshot = handle.progress();
        info!(
            items = snapshot.items,
            running = snapshot.running_workers,
            "Detached from walk"
        );
        if config.show_progress {
            print_detached(&snapshot);
        }
        // Safe mode is off, so this returns without waiting
        drop(handle);
        return Ok(());
    }

    let progress = show_progress.then(ProgressReporter::new);

    if let Some(ref p) = progress {
        while !handle.is_finished() {
            p.update(&handle.progress());
            thread::sleep(PROGRESS_INTERVAL);
        }
    }

    let result = handle.wait();

    // Finish progress
    if let Some(ref p) = progress {
        if result.completed {
            p.finish("Walk completed");
        } else {
            p.finish("Walk interrupted");
        }
    }

    if config.show_progress {
        print_summary(&result);
    }

    // Report success/failure
    if !result.completed {
        info!("Walk was interrupted before completion");
    }

    if result.totals.errors > 0 {
        info!(errors = result.totals.errors, "Walk completed with errors");
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("par_walker=debug,warn")
    } else {
        EnvFilter::new("par_walker=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
