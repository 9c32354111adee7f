//! filesweeper - duplicate file sweeper
//!
//! Finds duplicate files inside one directory tree, or copies of a source
//! tree's files inside a target tree, and optionally moves the duplicates
//! into a quarantine folder before pruning the folders they leave empty.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod sweep;

use std::io::{self, IsTerminal};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{Cli, OutputFormat, UsageError};
use crate::config::Config;
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::sweep::{SweepMode, Sweeper};

/// Run the application with parsed arguments.
///
/// # Errors
///
/// Returns a [`UsageError`] (wrapped in `anyhow`) for invalid arguments or
/// configuration, and other errors when a phase fails as a whole.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let json = cli.output == OutputFormat::Json;
    if cli.no_color || json || !io::stdout().is_terminal() {
        yansi::disable();
    }

    let roots = cli.roots()?;
    let config = Config::load(cli.config.as_deref())
        .and_then(|config| config.merge_cli(&cli))
        .map_err(UsageError::from)?;
    log::debug!("Configuration: {config:?}");

    let mode = SweepMode {
        move_files: cli.move_files,
        dry_run: cli.debug,
    };
    log::info!(
        "Sweeping {}{}{}",
        roots.source.display(),
        roots
            .target
            .as_ref()
            .map(|t| format!(" against {}", t.display()))
            .unwrap_or_default(),
        if mode.dry_run { " (dry run)" } else { "" }
    );

    let progress = Arc::new(Progress::new(cli.quiet || json));
    let report = Sweeper::new(&config)
        .with_progress(progress)
        .run(&roots, mode)
        .context("sweep aborted")?;

    let mut out = io::stdout().lock();
    output::write_report(&mut out, cli.output, &roots, &report, mode)
        .context("failed to write report")?;

    let code = report.exit_code();
    if code != ExitCode::Success {
        log::warn!("Completed with {} error(s)", report.error_count());
    }
    Ok(code)
}
