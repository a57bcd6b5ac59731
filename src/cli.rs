//! Command-line interface definitions for filematch.
//!
//! Every tuning flag is optional: when a flag is absent the value comes from
//! the configuration file, then the `FILEMATCH_*` environment, then the
//! built-in default (see [`crate::config`]).
//!
//! # Example
//!
//! ```bash
//! # Scan a directory with the default text report
//! filematch ~/Downloads
//!
//! # Machine-readable output for scripting
//! filematch ~/Downloads --output json
//!
//! # Fewer hashing workers on a spinning disk, bigger prefix
//! filematch /mnt/archive --hash-workers 4 --prefix-size 1MiB
//!
//! # Debug logging
//! filematch -v ~/Downloads
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::SettingsOverrides;

/// Find files with identical content under a directory tree.
///
/// Files are compared by size first, then by a digest of their first bytes,
/// and only then by a digest of their whole content.
#[derive(Debug, Parser)]
#[command(name = "filematch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// More log output: -v debug, -vv trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors and the report
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Number of concurrent directory-listing workers (default: 10)
    #[arg(long, value_name = "N")]
    pub dir_workers: Option<usize>,

    /// Number of concurrent hashing workers (default: 50)
    ///
    /// Spinning disks usually do better with far fewer.
    #[arg(long, value_name = "N")]
    pub hash_workers: Option<usize>,

    /// Capacity of the bounded work queues (default: 100)
    #[arg(long, value_name = "N")]
    pub queue_capacity: Option<usize>,

    /// Leading bytes digested by the prefix stage (e.g., 4KiB, 64KiB, 1MiB)
    ///
    /// Decimal and binary units are accepted: KB, KiB, MB, MiB, ...
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub prefix_size: Option<u64>,

    /// Smallest group of identical files worth reporting (default: 2)
    #[arg(long, value_name = "N")]
    pub min_group_size: Option<usize>,

    /// Seconds between progress statistics; 0 disables them (default: 60)
    #[arg(long = "stats-interval", value_name = "SECS")]
    pub stats_interval_secs: Option<u64>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Configuration file to use instead of the platform default
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// Tuning values given on the command line.
    #[must_use]
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            dir_workers: self.dir_workers,
            hash_workers: self.hash_workers,
            queue_capacity: self.queue_capacity,
            prefix_size: self.prefix_size,
            min_group_size: self.min_group_size,
            stats_interval_secs: self.stats_interval_secs,
        }
    }
}

/// How the report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable groups followed by the statistics summary
    Text,
    /// JSON document for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Unit suffixes accepted by [`parse_size`], upper-cased.
const SIZE_UNITS: &[(&str, u64)] = &[
    ("", 1),
    ("B", 1),
    ("K", 1_000),
    ("KB", 1_000),
    ("KIB", 1 << 10),
    ("M", 1_000_000),
    ("MB", 1_000_000),
    ("MIB", 1 << 20),
    ("G", 1_000_000_000),
    ("GB", 1_000_000_000),
    ("GIB", 1 << 30),
    ("T", 1_000_000_000_000),
    ("TB", 1_000_000_000_000),
    ("TIB", 1 << 40),
];

/// Turn `"64KiB"`, `"1.5MB"` or `"4096"` into a byte count.
///
/// Decimal (`KB`) and binary (`KiB`) units are both understood, in any case.
/// A bare number is bytes.
///
/// ```
/// use filematch::cli::parse_size;
///
/// assert_eq!(parse_size("64KiB").unwrap(), 65_536);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// ```
///
/// # Errors
///
/// Fails on empty input, a missing or negative number, or an unknown unit.
pub fn parse_size(input: &str) -> Result<u64, String> {
    let text = input.trim();
    let split = text
        .char_indices()
        .find(|&(_, c)| !(c.is_ascii_digit() || c == '.'))
        .map_or(text.len(), |(i, _)| i);
    let (number, unit) = text.split_at(split);

    if number.is_empty() {
        return Err(format!("Expected a size like 64KiB, got '{input}'"));
    }
    let value: f64 = number
        .parse()
        .map_err(|_| format!("'{number}' is not a number"))?;

    let unit = unit.trim().to_ascii_uppercase();
    let factor = SIZE_UNITS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|&(_, factor)| factor)
        .ok_or_else(|| format!("Unknown size unit '{unit}'"))?;

    Ok((value * factor as f64) as u64)
}
