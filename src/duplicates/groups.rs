//! Size bucketing and digest grouping.
//!
//! # Overview
//!
//! Both functions here are pure, single-pass and perform no I/O:
//!
//! - [`bucket_by_size`] groups discovered files by byte size. A file whose
//!   size nobody else shares cannot be a duplicate, so only buckets with at
//!   least `min_group_size` members survive. This is the first and cheapest
//!   filter.
//! - [`group_by_digest`] groups hashed files by `(size, digest)` for one
//!   stage and keeps groups with at least `min_group_size` members. It runs
//!   after the prefix stage to pick the full-hash candidates and after the
//!   full stage to produce the confirmed duplicates.
//!
//! Ordering of groups, and of files inside a group, is unspecified.
//!
//! # Example
//!
//! ```
//! use filematch::scanner::FileRecord;
//! use filematch::duplicates::bucket_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/file1.txt"), 1024),
//!     FileRecord::new(PathBuf::from("/file2.txt"), 1024),
//!     FileRecord::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! let (buckets, stats) = bucket_by_size(files, 2);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.candidates, 2);
//! assert_eq!(buckets.len(), 1);
//! ```

use std::collections::HashMap;

use serde::Serialize;

use crate::scanner::{hash_to_hex, FileRecord, Hash, Stage};

/// Smallest meaningful candidate group size.
pub const MIN_GROUP_SIZE: usize = 2;

/// Files sharing one digest (and size) at a given stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Digest shared by every file in the group
    pub hash: Hash,
    /// Size shared by every file in the group
    pub size: u64,
    /// Member files
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Space held by the copies beyond the first.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.files.len().saturating_sub(1) as u64
    }

    /// Hash as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<std::path::PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Statistics from size bucketing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BucketStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of distinct sizes seen
    pub unique_sizes: usize,
    /// Files in surviving buckets
    pub candidates: usize,
    /// Files dropped because their bucket was too small
    pub eliminated: usize,
    /// Number of surviving buckets
    pub buckets: usize,
}

impl BucketStats {
    /// Percentage of files eliminated by size bucketing.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size, keeping buckets with at least `min_group_size` files.
///
/// `min_group_size` below [`MIN_GROUP_SIZE`] is raised to it.
///
/// # Example
///
/// ```
/// use filematch::scanner::FileRecord;
/// use filematch::duplicates::bucket_by_size;
/// use std::path::PathBuf;
///
/// let files = vec![
///     FileRecord::new(PathBuf::from("/a.txt"), 100),
///     FileRecord::new(PathBuf::from("/b.txt"), 100),
///     FileRecord::new(PathBuf::from("/c.txt"), 200),
/// ];
///
/// let (buckets, stats) = bucket_by_size(files, 2);
/// assert_eq!(buckets[&100].len(), 2);
/// assert_eq!(stats.eliminated, 1);
/// ```
#[must_use]
pub fn bucket_by_size(
    files: impl IntoIterator<Item = FileRecord>,
    min_group_size: usize,
) -> (HashMap<u64, Vec<FileRecord>>, BucketStats) {
    let min_group_size = min_group_size.max(MIN_GROUP_SIZE);
    let mut buckets: HashMap<u64, Vec<FileRecord>> = HashMap::new();
    let mut stats = BucketStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;
        buckets.entry(file.size).or_default().push(file);
    }
    stats.unique_sizes = buckets.len();

    buckets.retain(|size, files| {
        if files.len() < min_group_size {
            stats.eliminated += files.len();
            log::trace!("Eliminated size {}: {} file(s)", size, files.len());
            false
        } else {
            stats.candidates += files.len();
            stats.buckets += 1;
            log::debug!("Size group {} bytes: {} candidates", size, files.len());
            true
        }
    });

    log::info!(
        "Size bucketing: {} files ({} bytes) in {} distinct sizes -> {} candidates in {} buckets ({:.1}% eliminated)",
        stats.total_files,
        stats.total_size,
        stats.unique_sizes,
        stats.candidates,
        stats.buckets,
        stats.elimination_rate()
    );

    (buckets, stats)
}

/// Group hashed files by `(size, digest)` for `stage`.
///
/// Files without a digest for `stage` are ignored. Groups smaller than
/// `min_group_size` (raised to [`MIN_GROUP_SIZE`] if lower) are dropped.
#[must_use]
pub fn group_by_digest(
    files: impl IntoIterator<Item = FileRecord>,
    stage: Stage,
    min_group_size: usize,
) -> Vec<DuplicateGroup> {
    let min_group_size = min_group_size.max(MIN_GROUP_SIZE);
    let mut by_digest: HashMap<(u64, Hash), Vec<FileRecord>> = HashMap::new();

    for file in files {
        match file.digest(stage) {
            Some(hash) => by_digest.entry((file.size, hash)).or_default().push(file),
            None => log::trace!("No {} digest for {}", stage, file.path.display()),
        }
    }

    by_digest
        .into_iter()
        .filter(|(_, files)| files.len() >= min_group_size)
        .map(|((size, hash), files)| {
            log::debug!(
                "{} digest group {}: {} files, {} bytes each",
                stage,
                hash_to_hex(&hash),
                files.len(),
                size
            );
            DuplicateGroup { hash, size, files }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record(name: &str, size: u64) -> FileRecord {
        FileRecord::new(PathBuf::from(name), size)
    }

    #[test]
    fn test_bucket_empty_input() {
        let (buckets, stats) = bucket_by_size(Vec::new(), 2);
        assert!(buckets.is_empty());
        assert_eq!(stats, BucketStats::default());
        assert_eq!(stats.elimination_rate(), 0.0);
    }

    #[test]
    fn test_bucket_all_unique() {
        let files = vec![record("/a", 1), record("/b", 2), record("/c", 3)];
        let (buckets, stats) = bucket_by_size(files, 2);

        assert!(buckets.is_empty());
        assert_eq!(stats.unique_sizes, 3);
        assert_eq!(stats.eliminated, 3);
        assert!((stats.elimination_rate() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bucket_ten_same_size() {
        let files: Vec<_> = (0..10).map(|i| record(&format!("/f{i}"), 1)).collect();
        let (buckets, stats) = bucket_by_size(files, 2);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[&1].len(), 10);
        assert_eq!(stats.candidates, 10);
        assert_eq!(stats.buckets, 1);
    }

    #[test]
    fn test_bucket_min_group_size_three() {
        let files = vec![
            record("/a1", 10),
            record("/a2", 10),
            record("/b1", 20),
            record("/b2", 20),
            record("/b3", 20),
        ];
        let (buckets, stats) = bucket_by_size(files, 3);

        assert_eq!(buckets.len(), 1);
        assert!(buckets.contains_key(&20));
        assert_eq!(stats.candidates, 3);
        assert_eq!(stats.eliminated, 2);
    }

    #[test]
    fn test_bucket_min_group_size_raised_to_two() {
        let files = vec![record("/a", 10), record("/b", 20)];
        let (buckets, _) = bucket_by_size(files, 0);
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_group_by_partial_digest() {
        let files = vec![
            record("/a", 5).with_partial([1; 32], 5),
            record("/b", 5).with_partial([1; 32], 5),
            record("/c", 5).with_partial([2; 32], 5),
        ];
        let groups = group_by_digest(files, Stage::Partial, 2);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].hash, [1; 32]);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0].size, 5);
    }

    #[test]
    fn test_group_requires_equal_size() {
        // Same prefix digest, different sizes: never one group.
        let files = vec![
            record("/a", 5).with_partial([1; 32], 4),
            record("/b", 6).with_partial([1; 32], 4),
        ];
        assert!(group_by_digest(files, Stage::Partial, 2).is_empty());
    }

    #[test]
    fn test_group_ignores_missing_digest() {
        let files = vec![
            record("/a", 5).with_partial([1; 32], 5),
            record("/b", 5).with_partial([1; 32], 5),
        ];
        assert!(group_by_digest(files, Stage::Full, 2).is_empty());
    }

    #[test]
    fn test_group_by_full_digest() {
        let files = vec![
            record("/a", 5).with_full([9; 32]),
            record("/b", 5).with_full([9; 32]),
            record("/c", 5).with_full([9; 32]),
            record("/d", 5).with_full([8; 32]),
            record("/e", 5).with_full([8; 32]),
        ];
        let mut groups = group_by_digest(files, Stage::Full, 2);
        groups.sort_by_key(|g| g.len());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].len(), 3);
        assert_eq!(groups[1].wasted_space(), 10);
        assert_eq!(groups[1].total_size(), 15);
    }

    #[test]
    fn test_duplicate_group_accessors() {
        let group = DuplicateGroup {
            hash: [0xab; 32],
            size: 7,
            files: vec![record("/x", 7), record("/y", 7)],
        };

        assert!(!group.is_empty());
        assert_eq!(group.hash_hex(), "ab".repeat(32));
        assert_eq!(group.paths(), vec![PathBuf::from("/x"), PathBuf::from("/y")]);
    }
}
