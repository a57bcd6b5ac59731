//! Process-wide scan statistics.
//!
//! Every scanner and hashing worker reports progress through a shared
//! [`StatsAggregator`]. Mutation goes through [`StatsAggregator::record`] and
//! reads through [`StatsAggregator::snapshot`], both under the same mutex, so
//! a periodic reporter always sees a consistent view.
//!
//! # Example
//!
//! ```
//! use filematch::stats::{StatEvent, StatsAggregator};
//!
//! let stats = StatsAggregator::new();
//! stats.record(StatEvent::DirectoryListed);
//! stats.record(StatEvent::FileDiscovered { bytes: 1024 });
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.directories, 1);
//! assert_eq!(snapshot.files, 1);
//! assert_eq!(snapshot.bytes, 1024);
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// A single progress event reported by a pipeline component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatEvent {
    /// A directory was discovered and queued for listing (root included).
    DirectoryListed,
    /// A non-fatal error was recovered locally.
    Error,
    /// A regular, non-empty file was discovered.
    FileDiscovered {
        /// File size in bytes
        bytes: u64,
    },
    /// A file prefix was digested.
    PartialHashed {
        /// Bytes actually read from the file
        bytes_read: u64,
        /// Full file size, used to account the bytes that were not read
        size: u64,
    },
    /// A file was digested in full.
    FullHashed {
        /// Bytes digested
        bytes: u64,
    },
    /// A full digest was taken over from a prefix digest that covered the whole file.
    FullHashReused,
    /// The walk phase started.
    WalkStarted,
    /// The walk phase finished.
    WalkFinished,
    /// The hashing phase started.
    HashStarted,
    /// The hashing phase finished.
    HashFinished,
    /// Number of files that survived size bucketing.
    SizeCandidates(u64),
    /// Number of files that survived prefix-hash grouping.
    PartialCandidates(u64),
    /// Confirmed duplicate groups and the number of files in them.
    Matches {
        /// Number of confirmed groups
        groups: u64,
        /// Number of files across those groups
        files: u64,
    },
}

/// Counters and timestamps describing one run.
///
/// Created once per run and never reset while the run is in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    /// Directories discovered (root plus every reachable subdirectory)
    pub directories: u64,
    /// Recovered errors (listing, open, read)
    pub errors: u64,
    /// Regular non-empty files discovered
    pub files: u64,
    /// Total bytes across discovered files
    pub bytes: u64,
    /// Files sharing their size with at least one other file
    pub size_candidates: u64,
    /// Prefix digests computed
    pub partial_hashes: u64,
    /// Bytes read for prefix digests
    pub partial_bytes: u64,
    /// Bytes that prefix hashing did not have to read
    pub partial_bytes_saved: u64,
    /// Files sharing size and prefix digest with at least one other file
    pub partial_candidates: u64,
    /// Full digests computed from disk
    pub full_hashes: u64,
    /// Full digests taken over from a complete prefix digest
    pub full_hashes_reused: u64,
    /// Bytes read for full digests
    pub full_bytes: u64,
    /// Confirmed duplicate groups
    pub duplicate_groups: u64,
    /// Files in confirmed duplicate groups
    pub matches: u64,
    /// Start of the directory walk
    pub walk_start: Option<Instant>,
    /// End of the directory walk
    pub walk_end: Option<Instant>,
    /// Start of the hashing phase
    pub hash_start: Option<Instant>,
    /// End of the hashing phase
    pub hash_end: Option<Instant>,
}

impl Stats {
    /// Apply one event to the counters.
    fn apply(&mut self, event: StatEvent) {
        match event {
            StatEvent::DirectoryListed => self.directories += 1,
            StatEvent::Error => self.errors += 1,
            StatEvent::FileDiscovered { bytes } => {
                self.files += 1;
                self.bytes += bytes;
            }
            StatEvent::PartialHashed { bytes_read, size } => {
                self.partial_hashes += 1;
                self.partial_bytes += bytes_read;
                self.partial_bytes_saved += size.saturating_sub(bytes_read);
            }
            StatEvent::FullHashed { bytes } => {
                self.full_hashes += 1;
                self.full_bytes += bytes;
            }
            StatEvent::FullHashReused => self.full_hashes_reused += 1,
            StatEvent::WalkStarted => self.walk_start = Some(Instant::now()),
            StatEvent::WalkFinished => self.walk_end = Some(Instant::now()),
            StatEvent::HashStarted => self.hash_start = Some(Instant::now()),
            StatEvent::HashFinished => self.hash_end = Some(Instant::now()),
            StatEvent::SizeCandidates(n) => self.size_candidates += n,
            StatEvent::PartialCandidates(n) => self.partial_candidates += n,
            StatEvent::Matches { groups, files } => {
                self.duplicate_groups += groups;
                self.matches += files;
            }
        }
    }

    /// Share of discovered files represented by `count`, in percent.
    #[must_use]
    pub fn percent_of_files(&self, count: u64) -> f64 {
        if self.files == 0 {
            0.0
        } else {
            count as f64 / self.files as f64 * 100.0
        }
    }

    /// Files dropped because no other file had the same size.
    #[must_use]
    pub fn eliminated_by_size(&self) -> u64 {
        self.files.saturating_sub(self.size_candidates)
    }

    /// Size candidates dropped by the prefix stage (unique prefix or unreadable).
    #[must_use]
    pub fn eliminated_by_partial(&self) -> u64 {
        self.size_candidates.saturating_sub(self.partial_candidates)
    }

    /// Prefix candidates dropped by the full-content stage.
    #[must_use]
    pub fn eliminated_by_full(&self) -> u64 {
        self.partial_candidates.saturating_sub(self.matches)
    }

    /// Seconds spent walking; runs up to now while the walk is in progress.
    #[must_use]
    pub fn walk_elapsed_secs(&self) -> f64 {
        elapsed_secs(self.walk_start, self.walk_end)
    }

    /// Seconds spent hashing; runs up to now while hashing is in progress.
    #[must_use]
    pub fn hash_elapsed_secs(&self) -> f64 {
        elapsed_secs(self.hash_start, self.hash_end)
    }

    /// Discovery throughput in files per second.
    #[must_use]
    pub fn walk_throughput(&self) -> f64 {
        rate(self.files as f64, self.walk_elapsed_secs())
    }

    /// Hashing throughput in bytes per second, across both stages.
    #[must_use]
    pub fn hash_throughput(&self) -> f64 {
        rate(
            (self.partial_bytes + self.full_bytes) as f64,
            self.hash_elapsed_secs(),
        )
    }
}

fn elapsed_secs(start: Option<Instant>, end: Option<Instant>) -> f64 {
    match (start, end) {
        (Some(start), Some(end)) => end.saturating_duration_since(start).as_secs_f64(),
        (Some(start), None) => start.elapsed().as_secs_f64(),
        _ => 0.0,
    }
}

fn rate(amount: f64, secs: f64) -> f64 {
    if secs > 0.0 {
        amount / secs
    } else {
        0.0
    }
}

/// Thread-safe owner of the run's [`Stats`].
///
/// Shared by handle (`Arc<StatsAggregator>`) with every component.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    inner: Mutex<Stats>,
}

impl StatsAggregator {
    /// Create an aggregator with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event.
    pub fn record(&self, event: StatEvent) {
        self.lock().apply(event);
    }

    /// Copy of the current counters, taken under the lock.
    #[must_use]
    pub fn snapshot(&self) -> Stats {
        self.lock().clone()
    }

    // A worker that panicked mid-update leaves plain counters behind, which
    // are still meaningful, so a poisoned lock is recovered.
    fn lock(&self) -> MutexGuard<'_, Stats> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
