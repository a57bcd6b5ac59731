//! Human-readable report.
//!
//! Groups are printed largest reclaimable space first, each as a header line
//! followed by its paths, then the statistics block:
//!
//! ```text
//! 3 files, 1.0 KiB each (3.0 KiB total), blake3 4f2a...
//!   ./a/report.pdf
//!   ./b/report.pdf
//!   ./c/report-copy.pdf
//!
//! 1 duplicate groups, 2.0 KiB reclaimable
//!
//! stats
//! dirs 3
//! ...
//! ```

use std::io::{self, Write};

use super::{format_size, StatsSummary};
use crate::duplicates::{DuplicateGroup, ScanSummary};

/// Text report over a finished scan.
#[derive(Debug)]
pub struct TextOutput<'a> {
    groups: Vec<&'a DuplicateGroup>,
    summary: &'a ScanSummary,
}

impl<'a> TextOutput<'a> {
    /// Create a report; groups are ordered by wasted space, then by first path.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], summary: &'a ScanSummary) -> Self {
        let mut groups: Vec<&DuplicateGroup> = groups.iter().collect();
        groups.sort_by(|a, b| {
            b.wasted_space()
                .cmp(&a.wasted_space())
                .then_with(|| first_path(a).cmp(&first_path(b)))
        });
        Self { groups, summary }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for group in &self.groups {
            writeln!(
                writer,
                "{} files, {} each ({} total), blake3 {}",
                group.len(),
                format_size(group.size),
                format_size(group.total_size()),
                group.hash_hex()
            )?;
            let mut paths = group.paths();
            paths.sort();
            for path in paths {
                writeln!(writer, "  {}", path.display())?;
            }
            writeln!(writer)?;
        }

        let reclaimable: u64 = self.groups.iter().map(|g| g.wasted_space()).sum();
        writeln!(
            writer,
            "{} duplicate groups, {} reclaimable",
            self.groups.len(),
            format_size(reclaimable)
        )?;
        if self.summary.interrupted {
            writeln!(writer, "scan interrupted; results are incomplete")?;
        }
        writeln!(writer)?;
        write!(writer, "{}", StatsSummary(&self.summary.stats))?;
        writeln!(
            writer,
            "elapsed {:.2}s",
            self.summary.scan_duration.as_secs_f64()
        )
    }

    /// Render the report into a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

fn first_path(group: &DuplicateGroup) -> Option<&std::path::Path> {
    group.files.iter().map(|f| f.path.as_path()).min()
}
