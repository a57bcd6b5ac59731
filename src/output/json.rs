//! JSON report.
//!
//! ```json
//! {
//!   "groups": [
//!     { "digest": "4f2a...", "size": 1024, "paths": ["/a/x.bin", "/b/x.bin"] }
//!   ],
//!   "summary": {
//!     "directories": 12,
//!     "files": 100,
//!     "errors": 0,
//!     "groups": 5,
//!     "matched_files": 12,
//!     "reclaimable_bytes": 51200,
//!     "elapsed_ms": 1234,
//!     "interrupted": false,
//!     "exit_code": 0,
//!     "exit_code_name": "FM000"
//!   }
//! }
//! ```
//!
//! The summary also carries every other statistics counter. Groups are
//! ordered by their sorted path lists so two runs over the same tree print
//! the same document apart from timings.

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// Lowercase hex BLAKE3 digest of the content.
    pub digest: String,
    pub size: u64,
    pub paths: Vec<String>,
}

impl From<&DuplicateGroup> for JsonGroup {
    fn from(group: &DuplicateGroup) -> Self {
        let mut paths: Vec<String> = group
            .paths()
            .into_iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        paths.sort_unstable();
        Self {
            digest: group.hash_hex(),
            size: group.size,
            paths,
        }
    }
}

/// Counters, derived totals and outcome of the run.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub directories: u64,
    pub files: u64,
    pub bytes: u64,
    pub errors: u64,
    pub size_matches: u64,
    pub partial_hash_matches: u64,
    pub partial_hashes: u64,
    pub partial_bytes: u64,
    /// Bytes of size-matched files the prefix stage skipped.
    pub partial_bytes_saved: u64,
    pub full_hashes: u64,
    /// Full digests taken over from a prefix digest that covered the file.
    pub full_hashes_reused: u64,
    pub full_bytes: u64,
    pub eliminated_by_size: u64,
    pub eliminated_by_partial: u64,
    pub eliminated_by_full: u64,
    pub groups: u64,
    pub matched_files: u64,
    /// Bytes held by every copy after the first in each group.
    pub reclaimable_bytes: u64,
    pub walk_files_per_sec: f64,
    pub hash_bytes_per_sec: f64,
    pub elapsed_ms: u64,
    pub interrupted: bool,
    pub exit_code: i32,
    pub exit_code_name: String,
}

impl JsonSummary {
    fn build(summary: &ScanSummary, groups: &[DuplicateGroup], exit_code: ExitCode) -> Self {
        let stats = &summary.stats;
        Self {
            directories: stats.directories,
            files: stats.files,
            bytes: stats.bytes,
            errors: stats.errors,
            size_matches: stats.size_candidates,
            partial_hash_matches: stats.partial_candidates,
            partial_hashes: stats.partial_hashes,
            partial_bytes: stats.partial_bytes,
            partial_bytes_saved: stats.partial_bytes_saved,
            full_hashes: stats.full_hashes,
            full_hashes_reused: stats.full_hashes_reused,
            full_bytes: stats.full_bytes,
            eliminated_by_size: stats.eliminated_by_size(),
            eliminated_by_partial: stats.eliminated_by_partial(),
            eliminated_by_full: stats.eliminated_by_full(),
            groups: groups.len() as u64,
            matched_files: groups.iter().map(|g| g.len() as u64).sum(),
            reclaimable_bytes: ScanSummary::reclaimable_space(groups),
            walk_files_per_sec: stats.walk_throughput(),
            hash_bytes_per_sec: stats.hash_throughput(),
            elapsed_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
            interrupted: summary.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// The whole JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub groups: Vec<JsonGroup>,
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// ```
    /// use filematch::duplicates::ScanSummary;
    /// use filematch::error::ExitCode;
    /// use filematch::output::json::JsonOutput;
    ///
    /// let output = JsonOutput::new(&[], &ScanSummary::default(), ExitCode::NoDuplicates);
    /// assert!(output.groups.is_empty());
    /// assert_eq!(output.summary.exit_code, 2);
    /// ```
    #[must_use]
    pub fn new(groups: &[DuplicateGroup], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        let mut json_groups: Vec<JsonGroup> = groups.iter().map(JsonGroup::from).collect();
        json_groups.sort_by(|a, b| a.paths.cmp(&b.paths));
        Self {
            groups: json_groups,
            summary: JsonSummary::build(summary, groups, exit_code),
        }
    }

    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the document followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns [`JsonOutputError`] if serializing or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        if pretty {
            serde_json::to_writer_pretty(&mut *writer, self)?;
        } else {
            serde_json::to_writer(&mut *writer, self)?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    #[error("Could not encode report: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Could not write report: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::FileRecord;
    use crate::stats::Stats;
    use std::path::PathBuf;

    fn three_copies() -> Vec<DuplicateGroup> {
        vec![DuplicateGroup {
            hash: [0xcd; 32],
            size: 100,
            files: vec![
                FileRecord::new(PathBuf::from("/z/copy"), 100),
                FileRecord::new(PathBuf::from("/a/orig"), 100),
                FileRecord::new(PathBuf::from("/m/copy2"), 100),
            ],
        }]
    }

    #[test]
    fn test_document_fields() {
        let groups = three_copies();
        let summary = ScanSummary {
            stats: Stats {
                files: 7,
                directories: 2,
                size_candidates: 5,
                partial_candidates: 4,
                matches: 3,
                ..Stats::default()
            },
            ..ScanSummary::default()
        };
        let output = JsonOutput::new(&groups, &summary, ExitCode::Success);
        let value = serde_json::to_value(&output).unwrap();

        let group = &value["groups"][0];
        assert_eq!(group["digest"], "cd".repeat(32));
        assert_eq!(group["size"], 100);
        assert_eq!(group["paths"][0], "/a/orig");
        assert_eq!(group["paths"][2], "/z/copy");

        let s = &value["summary"];
        assert_eq!(s["files"], 7);
        assert_eq!(s["directories"], 2);
        assert_eq!(s["eliminated_by_size"], 2);
        assert_eq!(s["eliminated_by_partial"], 1);
        assert_eq!(s["eliminated_by_full"], 1);
        assert_eq!(s["groups"], 1);
        assert_eq!(s["matched_files"], 3);
        assert_eq!(s["reclaimable_bytes"], 200);
        assert_eq!(s["exit_code"], 0);
        assert_eq!(s["exit_code_name"], "FM000");
        assert_eq!(s["interrupted"], false);
    }

    #[test]
    fn test_groups_ordered_by_paths() {
        let mut groups = three_copies();
        groups.insert(
            0,
            DuplicateGroup {
                hash: [0x01; 32],
                size: 5,
                files: vec![
                    FileRecord::new(PathBuf::from("/q/two"), 5),
                    FileRecord::new(PathBuf::from("/q/one"), 5),
                ],
            },
        );
        let output = JsonOutput::new(&groups, &ScanSummary::default(), ExitCode::Success);
        assert_eq!(output.groups[0].paths[0], "/a/orig");
        assert_eq!(output.groups[1].paths, vec!["/q/one", "/q/two"]);
    }

    #[test]
    fn test_write_to_ends_with_newline() {
        let output = JsonOutput::new(&[], &ScanSummary::default(), ExitCode::NoDuplicates);

        let mut compact = Vec::new();
        output.write_to(&mut compact, false).unwrap();
        let compact = String::from_utf8(compact).unwrap();
        assert!(compact.ends_with("}\n"));
        assert_eq!(compact.lines().count(), 1);

        let mut pretty = Vec::new();
        output.write_to(&mut pretty, true).unwrap();
        let pretty = String::from_utf8(pretty).unwrap();
        assert!(pretty.contains("\"exit_code_name\": \"FM002\""));
    }
}
