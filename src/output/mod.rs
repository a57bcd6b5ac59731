//! Output formatters for duplicate scan results.
//!
//! This module provides the two report formats plus the statistics block
//! shared by the final report and the periodic progress line:
//! - [`text`] for people: each group, then the statistics summary
//! - [`json`] for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use filematch::duplicates::DuplicateFinder;
//! use filematch::error::ExitCode;
//! use filematch::output::json::JsonOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! let output = JsonOutput::new(&groups, &summary, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

use std::fmt;

use bytesize::ByteSize;

use crate::stats::Stats;

// Re-export main types
pub use json::JsonOutput;
pub use text::TextOutput;

/// Format a byte count with IEC units.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Multi-line statistics block.
///
/// Percentages are relative to the number of files discovered. Throughputs
/// cover only the phases that have started.
#[derive(Debug, Clone, Copy)]
pub struct StatsSummary<'a>(pub &'a Stats);

impl fmt::Display for StatsSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        writeln!(f, "stats")?;
        writeln!(f, "dirs {}", s.directories)?;
        writeln!(f, "errors {}", s.errors)?;
        writeln!(f, "files {}", s.files)?;
        writeln!(
            f,
            "full hashes {} ({} reused from prefix)",
            s.full_hashes, s.full_hashes_reused
        )?;
        writeln!(f, "partial hashes {}", s.partial_hashes)?;
        writeln!(f, "bytes {}", format_size(s.bytes))?;
        writeln!(f, "bytes partially hashed {}", format_size(s.partial_bytes))?;
        writeln!(f, "partial hash saving {}", format_size(s.partial_bytes_saved))?;
        writeln!(f, "bytes fully hashed {}", format_size(s.full_bytes))?;
        writeln!(
            f,
            "matches {} ({:.0}%) in {} groups",
            s.matches,
            s.percent_of_files(s.matches),
            s.duplicate_groups
        )?;
        writeln!(
            f,
            "size matches {} ({:.0}%)",
            s.size_candidates,
            s.percent_of_files(s.size_candidates)
        )?;
        writeln!(
            f,
            "partial hash matches {} ({:.0}%)",
            s.partial_candidates,
            s.percent_of_files(s.partial_candidates)
        )?;
        writeln!(f, "eliminated by size {}", s.eliminated_by_size())?;
        writeln!(f, "eliminated by partial hash {}", s.eliminated_by_partial())?;
        writeln!(f, "eliminated by full hash {}", s.eliminated_by_full())?;
        if s.hash_start.is_some() {
            writeln!(
                f,
                "hash throughput {}/s",
                format_size(s.hash_throughput() as u64)
            )?;
        }
        if s.walk_start.is_some() {
            writeln!(f, "readdir throughput {:.2} files/s", s.walk_throughput())?;
        }
        Ok(())
    }
}

/// One-line progress summary for the periodic reporter.
#[must_use]
pub fn progress_line(s: &Stats) -> String {
    format!(
        "dirs {} | files {} ({}) | errors {} | partial hashes {} | full hashes {} | matches {}",
        s.directories,
        s.files,
        format_size(s.bytes),
        s.errors,
        s.partial_hashes,
        s.full_hashes + s.full_hashes_reused,
        s.matches
    )
}
