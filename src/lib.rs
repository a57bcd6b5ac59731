//! filematch - concurrent duplicate file finder
//!
//! Walks a directory tree with a pool of listing workers, then narrows the
//! discovered files down to groups with identical content in stages of
//! increasing cost: equal size, equal prefix digest, equal full digest.
//!
//! # Modules
//!
//! - [`scanner`]: file records, the concurrent walker and the BLAKE3 hasher
//! - [`duplicates`]: size bucketing, digest grouping and the staged finder
//! - [`pool`]: bounded worker pool shared by both hashing stages
//! - [`stats`]: thread-safe run statistics
//! - [`progress`]: periodic statistics reporting
//! - [`output`]: text and JSON reports
//! - [`cli`], [`config`], [`logging`], [`signal`], [`error`]: application plumbing

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod pool;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod stats;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use cli::{Cli, OutputFormat};
use config::Settings;
use duplicates::DuplicateFinder;
use error::ExitCode;
use output::{JsonOutput, TextOutput};
use progress::StatsReporter;
use stats::StatsAggregator;

/// Run the application for parsed command-line arguments.
///
/// Loads layered settings, installs the Ctrl+C handler, scans `cli.path`,
/// and writes the report to stdout. An interrupted scan still produces a
/// report over what was confirmed before the interruption.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the root cannot be
/// scanned at all, or the report cannot be written.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let settings = Settings::load(cli.config.as_deref(), &cli.overrides())
        .context("Failed to load configuration")?;
    let handler = signal::install_handler().context("Failed to set up Ctrl+C handling")?;

    let stats = Arc::new(StatsAggregator::new());
    let reporter = match settings.stats_interval() {
        Some(interval) => Some(
            StatsReporter::start(Arc::clone(&stats), interval)
                .context("Failed to start stats reporter")?,
        ),
        None => None,
    };

    let finder = DuplicateFinder::new(
        settings
            .finder_config()
            .with_shutdown_flag(handler.flag()),
    )
    .with_stats(Arc::clone(&stats));

    let result = finder.find_duplicates(&cli.path);
    if let Some(reporter) = reporter {
        reporter.stop();
    }
    let (groups, summary) =
        result.with_context(|| format!("Failed to scan {}", cli.path.display()))?;

    let exit_code = ExitCode::for_outcome(groups.len(), summary.stats.errors, summary.interrupted);
    if summary.stats.errors > 0 {
        log::warn!(
            "{} files or directories could not be read and were skipped",
            summary.stats.errors
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.output {
        OutputFormat::Text => TextOutput::new(&groups, &summary)
            .write_to(&mut out)
            .context("Failed to write report")?,
        OutputFormat::Json => JsonOutput::new(&groups, &summary, exit_code)
            .write_to(&mut out, true)
            .context("Failed to write report")?,
    }
    out.flush().context("Failed to write report")?;

    Ok(exit_code)
}
