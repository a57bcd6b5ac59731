//! Duplicate finder implementation with staged, cost-increasing matching.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Walk**: collect every regular non-empty file under the root
//! 2. **Size bucketing**: keep files whose size is shared (no I/O)
//! 3. **Prefix hash**: digest the first `prefix_size` bytes of each candidate
//! 4. **Full hash**: digest whole files, only for prefix-digest survivors
//!
//! Files are reported as duplicates only if size, prefix digest and full
//! digest all match. Each hashing stage runs on a [`WorkerPool`]; unreadable
//! files are counted, logged and dropped from the stage.
//!
//! # Example
//!
//! ```no_run
//! use filematch::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_hash_workers(16));
//! let (groups, summary) = finder.find_duplicates(Path::new("/srv/media")).unwrap();
//!
//! println!("{} duplicate groups", groups.len());
//! println!("{} files scanned", summary.stats.files);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::groups::{bucket_by_size, group_by_digest, DuplicateGroup, MIN_GROUP_SIZE};
use crate::pool::WorkerPool;
use crate::scanner::{
    DirectoryScanner, FileRecord, Hasher, ScanError, ScannerConfig, Stage, DEFAULT_PREFIX_SIZE,
};
use crate::stats::{StatEvent, Stats, StatsAggregator};

/// Output of one hashing stage.
#[derive(Debug, Default)]
pub struct StageOutput {
    /// Records that were hashed successfully, digest attached
    pub hashed: Vec<FileRecord>,
    /// Whether the stage was cut short by the shutdown flag
    pub interrupted: bool,
}

/// Stage A: attach a prefix digest to every candidate.
///
/// Unreadable or empty files are counted as errors and left out.
pub fn partial_hash_stage(
    candidates: Vec<FileRecord>,
    hasher: &Hasher,
    pool: &WorkerPool,
    stats: &StatsAggregator,
) -> StageOutput {
    log::info!(
        "Prefix hashing {} files ({} bytes each at most)",
        candidates.len(),
        hasher.prefix_size()
    );

    let output = pool.run(candidates, |record: FileRecord| {
        match hasher.prefix_hash(&record.path) {
            Ok(digest) => {
                stats.record(StatEvent::PartialHashed {
                    bytes_read: digest.bytes_read,
                    size: record.size,
                });
                log::trace!("Prefix hash computed: {}", record.path.display());
                Some(record.with_partial(digest.hash, digest.bytes_read))
            }
            Err(e) => {
                log::warn!("Failed to prefix hash {}: {}", record.path.display(), e);
                stats.record(StatEvent::Error);
                None
            }
        }
    });

    StageOutput {
        hashed: output.results,
        interrupted: output.interrupted,
    }
}

/// Stage B: attach a full-content digest to every candidate.
///
/// When the prefix digest already covers the whole file it is reused as the
/// full digest without reading the file again. Unreadable files, and files
/// whose length no longer matches the size seen during the walk, are counted
/// as errors and left out.
pub fn full_hash_stage(
    candidates: Vec<FileRecord>,
    hasher: &Hasher,
    pool: &WorkerPool,
    stats: &StatsAggregator,
) -> StageOutput {
    log::info!("Full hashing {} files", candidates.len());

    let output = pool.run(candidates, |record: FileRecord| {
        if record.partial_covers_file() {
            if let Some(hash) = record.partial_hash {
                stats.record(StatEvent::FullHashReused);
                return Some(record.with_full(hash));
            }
        }

        match hasher.full_hash(&record.path, record.size) {
            Ok(hash) => {
                stats.record(StatEvent::FullHashed { bytes: record.size });
                log::trace!(
                    "Full hash computed: {} ({} bytes)",
                    record.path.display(),
                    record.size
                );
                Some(record.with_full(hash))
            }
            Err(e) => {
                log::warn!("Failed to hash {}: {}", record.path.display(), e);
                stats.record(StatEvent::Error);
                None
            }
        }
    });

    StageOutput {
        hashed: output.results,
        interrupted: output.interrupted,
    }
}

/// Flatten digest groups back into a candidate list for the next stage.
#[must_use]
pub fn promote(groups: Vec<DuplicateGroup>) -> Vec<FileRecord> {
    groups.into_iter().flat_map(|g| g.files).collect()
}

// ============================================================================
// DuplicateFinder - Pipeline Orchestrator
// ============================================================================

/// Configuration for the duplicate finder.
#[derive(Debug, Clone)]
pub struct FinderConfig {
    /// Number of concurrent directory-listing workers.
    pub dir_workers: usize,
    /// Number of concurrent hashing workers per stage.
    pub hash_workers: usize,
    /// Capacity of the bounded job and result queues.
    pub queue_capacity: usize,
    /// Bytes digested by the prefix stage.
    pub prefix_size: u64,
    /// Smallest group (size bucket or digest group) worth hashing or reporting.
    pub min_group_size: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            dir_workers: 10,
            hash_workers: 50,
            queue_capacity: 100,
            prefix_size: DEFAULT_PREFIX_SIZE,
            min_group_size: MIN_GROUP_SIZE,
            shutdown_flag: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of directory-listing workers.
    #[must_use]
    pub fn with_dir_workers(mut self, workers: usize) -> Self {
        self.dir_workers = workers.max(1);
        self
    }

    /// Set the number of hashing workers.
    #[must_use]
    pub fn with_hash_workers(mut self, workers: usize) -> Self {
        self.hash_workers = workers.max(1);
        self
    }

    /// Set the capacity of the bounded queues.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the number of bytes digested by the prefix stage.
    #[must_use]
    pub fn with_prefix_size(mut self, bytes: u64) -> Self {
        self.prefix_size = bytes.max(1);
        self
    }

    /// Set the smallest candidate group size.
    #[must_use]
    pub fn with_min_group_size(mut self, size: usize) -> Self {
        self.min_group_size = size.max(MIN_GROUP_SIZE);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary of a duplicate scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Counters at the end of the run
    pub stats: Stats,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Whether the scan was cut short; groups are then sound but may be incomplete
    pub interrupted: bool,
}

impl ScanSummary {
    /// Space held by copies beyond the first in each group.
    #[must_use]
    pub fn reclaimable_space(groups: &[DuplicateGroup]) -> u64 {
        groups.iter().map(DuplicateGroup::wasted_space).sum()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan root cannot be walked at all.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Duplicate finder that orchestrates the staged detection pipeline.
///
/// # Example
///
/// ```no_run
/// use filematch::duplicates::{DuplicateFinder, FinderConfig};
/// use filematch::stats::StatsAggregator;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// let stats = Arc::new(StatsAggregator::new());
/// let finder = DuplicateFinder::new(FinderConfig::default()).with_stats(Arc::clone(&stats));
///
/// match finder.find_duplicates(Path::new(".")) {
///     Ok((groups, _)) => println!("Found {} duplicate groups", groups.len()),
///     Err(e) => eprintln!("Scan failed: {}", e),
/// }
/// ```
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
    stats: Arc<StatsAggregator>,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let hasher = Hasher::new().with_prefix_size(config.prefix_size);
        Self {
            config,
            hasher,
            stats: Arc::new(StatsAggregator::new()),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Report into an externally owned aggregator (e.g. one a periodic reporter reads).
    ///
    /// Counters are never reset, so runs sharing an aggregator accumulate.
    #[must_use]
    pub fn with_stats(mut self, stats: Arc<StatsAggregator>) -> Self {
        self.stats = stats;
        self
    }

    /// The aggregator this finder reports into.
    #[must_use]
    pub fn stats(&self) -> Arc<StatsAggregator> {
        Arc::clone(&self.stats)
    }

    fn hash_pool(&self) -> WorkerPool {
        let pool = WorkerPool::new(self.config.hash_workers, self.config.queue_capacity);
        match self.config.shutdown_flag {
            Some(ref flag) => pool.with_shutdown_flag(Arc::clone(flag)),
            None => pool,
        }
    }

    /// Find all duplicate files under `root`.
    ///
    /// Per-file and per-directory errors are recovered and counted in
    /// `summary.stats.errors`. If the shutdown flag is raised, the pipeline
    /// stops after the running stage and returns with
    /// `summary.interrupted` set.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError`] only if the root does not exist or is not a
    /// directory.
    pub fn find_duplicates(
        &self,
        root: &std::path::Path,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        log::info!("Starting duplicate scan of {}", root.display());

        // Walk
        let mut scanner = DirectoryScanner::new(
            ScannerConfig::new(self.config.dir_workers, self.config.queue_capacity),
            Arc::clone(&self.stats),
        );
        if let Some(ref flag) = self.config.shutdown_flag {
            scanner = scanner.with_shutdown_flag(Arc::clone(flag));
        }

        self.stats.record(StatEvent::WalkStarted);
        let walk = scanner.scan(root);
        self.stats.record(StatEvent::WalkFinished);
        let walk = walk?;

        if walk.interrupted || self.config.is_shutdown_requested() {
            return Ok((Vec::new(), self.summary(start_time, true)));
        }

        let (groups, interrupted) = self.match_files(walk.files);
        Ok((groups, self.summary(start_time, interrupted)))
    }

    /// Run the matching stages over an already collected file list.
    ///
    /// Use this when files come from another source than the built-in
    /// walker. Returns the confirmed groups and whether a stage was
    /// interrupted.
    pub fn find_duplicates_in_files(&self, files: Vec<FileRecord>) -> (Vec<DuplicateGroup>, bool) {
        self.match_files(files)
    }

    fn match_files(&self, files: Vec<FileRecord>) -> (Vec<DuplicateGroup>, bool) {
        let min_group_size = self.config.min_group_size;

        // Size bucketing
        let (buckets, bucket_stats) = bucket_by_size(files, min_group_size);
        self.stats
            .record(StatEvent::SizeCandidates(bucket_stats.candidates as u64));
        if buckets.is_empty() {
            log::info!("No potential duplicates found after size bucketing");
            return (Vec::new(), false);
        }
        let candidates: Vec<FileRecord> = buckets.into_values().flatten().collect();

        let pool = self.hash_pool();
        self.stats.record(StatEvent::HashStarted);

        // Stage A
        let partial = partial_hash_stage(candidates, &self.hasher, &pool, &self.stats);
        if partial.interrupted {
            self.stats.record(StatEvent::HashFinished);
            return (Vec::new(), true);
        }
        let partial_groups = group_by_digest(partial.hashed, Stage::Partial, min_group_size);
        let survivors = promote(partial_groups);
        self.stats
            .record(StatEvent::PartialCandidates(survivors.len() as u64));
        log::info!("Prefix stage complete: {} candidates remain", survivors.len());

        if survivors.is_empty() {
            self.stats.record(StatEvent::HashFinished);
            return (Vec::new(), false);
        }

        // Stage B
        let full = full_hash_stage(survivors, &self.hasher, &pool, &self.stats);
        self.stats.record(StatEvent::HashFinished);
        let groups = group_by_digest(full.hashed, Stage::Full, min_group_size);

        let matched: usize = groups.iter().map(DuplicateGroup::len).sum();
        self.stats.record(StatEvent::Matches {
            groups: groups.len() as u64,
            files: matched as u64,
        });
        log::info!(
            "Scan complete: {} duplicate groups, {} files, {} bytes reclaimable",
            groups.len(),
            matched,
            ScanSummary::reclaimable_space(&groups)
        );

        (groups, full.interrupted)
    }

    fn summary(&self, start_time: Instant, interrupted: bool) -> ScanSummary {
        ScanSummary {
            stats: self.stats.snapshot(),
            scan_duration: start_time.elapsed(),
            interrupted,
        }
    }
}
