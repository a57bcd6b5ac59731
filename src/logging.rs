//! Logging setup for filematch.
//!
//! Messages go through the `log` facade to an `env_logger` backend on
//! stderr, so they never mix with the report on stdout. The level comes from
//! `RUST_LOG` when it is set, otherwise from the `-v`/`-q` flags:
//!
//! | flags     | level |
//! |-----------|-------|
//! | `-q`      | error |
//! | (none)    | info  |
//! | `-v`      | debug |
//! | `-vv`     | trace |
//!
//! Recovered per-file errors are logged at warn, phase boundaries and the
//! periodic statistics line at info, per-group detail at debug and per-file
//! detail at trace. At debug and above each line names the thread that wrote
//! it, which tells listing workers and hashing workers apart.
//!
//! # Example
//!
//! ```rust,no_run
//! use filematch::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("visible with -v");
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Install the global logger.
///
/// Only the first call in a process installs anything; later calls are
/// no-ops, which lets tests call `run_app` repeatedly.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=normal, 1=debug, 2+=trace)
/// * `quiet` - If true, only show errors (overridden by RUST_LOG)
pub fn init_logging(verbose: u8, quiet: bool) {
    let from_env = env::var("RUST_LOG").ok();

    let mut builder = Builder::new();
    match from_env {
        Some(ref filters) => {
            builder.parse_filters(filters);
        }
        None => {
            builder.filter_level(determine_level(verbose, quiet));
        }
    }
    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);

        if cfg!(debug_assertions) && verbose >= 1 {
            let thread = std::thread::current();
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{} @ {}] {}",
                buf.timestamp_millis(),
                level,
                record.target(),
                thread.name().unwrap_or("worker"),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{:<5}{style:#} {}", level, record.args())
        }
    });

    if builder.try_init().is_ok() {
        match from_env {
            Some(filters) => log::debug!("Log filters from RUST_LOG: {}", filters),
            None => log::debug!("Log level: {}", current_level_name()),
        }
    }
}

/// Map the CLI flags to a level; `quiet` wins over `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Name of the most verbose level currently enabled.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
