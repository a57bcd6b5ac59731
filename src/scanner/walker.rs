//! Concurrent directory walker with a bounded pool of listing workers.
//!
//! # Overview
//!
//! [`DirectoryScanner::scan`] walks a tree breadth-first. A fixed number of
//! worker threads take directory paths from a bounded job queue, list them,
//! and report every discovery back to the coordinator (the calling thread)
//! over a single bounded event channel:
//!
//! - subdirectories come back as [`WalkEvent::Directory`] and are queued again;
//! - regular files with a non-zero size come back as [`WalkEvent::File`];
//! - listing failures come back as [`WalkEvent::Error`];
//! - every job ends with exactly one [`WalkEvent::Done`].
//!
//! # Termination
//!
//! The total amount of work is unknown up front, so the coordinator keeps an
//! outstanding-job counter: it starts at 1 for the root, goes up by one for
//! every job handed to the queue and down by one for every `Done`. The walk
//! is over when it reaches zero.
//!
//! The coordinator never blocks on the job queue. Subdirectories that do not
//! fit are parked in a local buffer and retried after each event, so the
//! coordinator always keeps draining events and workers blocked on a full
//! event channel always make progress. The buffer can only be non-empty
//! while at least one job is outstanding: with nothing outstanding the queue
//! is empty and the retry succeeds.
//!
//! The listing pool does not reuse [`crate::pool::WorkerPool`]: that pool
//! is fed a job list known up front, while here the workers produce their
//! own follow-up jobs through the coordinator.
//!
//! Symbolic links, devices, sockets and empty files are skipped.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::{FileRecord, ScanError, ScannerConfig};
use crate::stats::{StatEvent, StatsAggregator};

/// Discovery reported by a listing worker.
#[derive(Debug)]
pub enum WalkEvent {
    /// A subdirectory to list
    Directory(PathBuf),
    /// A regular, non-empty file
    File(FileRecord),
    /// A directory or entry that could not be read
    Error(ScanError),
    /// The worker finished one job
    Done,
}

/// Result of a completed walk.
#[derive(Debug, Default)]
pub struct WalkOutput {
    /// Every regular non-empty file found
    pub files: Vec<FileRecord>,
    /// Whether the walk was cut short by the shutdown flag
    pub interrupted: bool,
}

/// Concurrent directory walker.
#[derive(Debug)]
pub struct DirectoryScanner {
    config: ScannerConfig,
    stats: Arc<StatsAggregator>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl DirectoryScanner {
    /// Create a scanner.
    ///
    /// # Arguments
    ///
    /// * `config` - Worker count and channel capacity
    /// * `stats` - Aggregator receiving directory, file and error counts
    #[must_use]
    pub fn new(config: ScannerConfig, stats: Arc<StatsAggregator>) -> Self {
        Self {
            config,
            stats,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set, queued directories are acknowledged without
    /// being listed and the walk returns what it has found so far.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        is_set(self.shutdown_flag.as_deref())
    }

    /// Walk the tree rooted at `root`.
    ///
    /// Unreadable directories and entries are counted and logged, and the
    /// walk continues without them.
    ///
    /// # Errors
    ///
    /// Fails only if `root` does not exist, is not a directory, or its
    /// metadata cannot be read.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filematch::scanner::{DirectoryScanner, ScannerConfig};
    /// use filematch::stats::StatsAggregator;
    /// use std::path::Path;
    /// use std::sync::Arc;
    ///
    /// let stats = Arc::new(StatsAggregator::new());
    /// let scanner = DirectoryScanner::new(ScannerConfig::new(4, 64), Arc::clone(&stats));
    /// let output = scanner.scan(Path::new("/var/data")).unwrap();
    ///
    /// println!("{} files in {} directories", output.files.len(), stats.snapshot().directories);
    /// ```
    pub fn scan(&self, root: &Path) -> Result<WalkOutput, ScanError> {
        check_root(root)?;

        let workers = self.config.workers.max(1);
        let (job_tx, job_rx) = bounded::<PathBuf>(workers);
        let (event_tx, event_rx) = bounded::<WalkEvent>(self.config.event_capacity.max(1));
        let shutdown = self.shutdown_flag.as_deref();

        log::info!(
            "Walking {} with {} listing workers",
            root.display(),
            workers
        );

        thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let event_tx = event_tx.clone();
                scope.spawn(move || list_worker(&job_rx, &event_tx, shutdown));
            }
            drop(job_rx);
            drop(event_tx);

            // The root fits: the queue is empty and has capacity >= 1.
            self.stats.record(StatEvent::DirectoryListed);
            let mut outstanding: usize = match job_tx.try_send(root.to_path_buf()) {
                Ok(()) => 1,
                Err(_) => 0,
            };

            let output = self.coordinate(&job_tx, &event_rx, &mut outstanding);

            // Closing the queue lets idle workers exit.
            drop(job_tx);
            output
        })
        .map(|output| {
            log::info!(
                "Walk complete: {} files{}",
                output.files.len(),
                if output.interrupted {
                    " (interrupted)"
                } else {
                    ""
                }
            );
            output
        })
    }

    /// Drain worker events until no job is outstanding.
    fn coordinate(
        &self,
        job_tx: &Sender<PathBuf>,
        event_rx: &Receiver<WalkEvent>,
        outstanding: &mut usize,
    ) -> Result<WalkOutput, ScanError> {
        let mut output = WalkOutput::default();
        let mut pending: VecDeque<PathBuf> = VecDeque::new();

        while *outstanding > 0 {
            let Ok(event) = event_rx.recv() else {
                // Every worker is gone; nothing else can complete.
                log::error!("Walker: all listing workers exited with {} jobs outstanding", outstanding);
                break;
            };

            match event {
                WalkEvent::Directory(path) => {
                    self.stats.record(StatEvent::DirectoryListed);
                    pending.push_back(path);
                }
                WalkEvent::File(record) => {
                    self.stats
                        .record(StatEvent::FileDiscovered { bytes: record.size });
                    output.files.push(record);
                }
                WalkEvent::Error(err) => {
                    log::warn!("{}", err);
                    self.stats.record(StatEvent::Error);
                }
                WalkEvent::Done => *outstanding -= 1,
            }

            if self.is_shutdown_requested() {
                if !pending.is_empty() {
                    log::debug!(
                        "Walker: shutdown requested, dropping {} queued directories",
                        pending.len()
                    );
                    pending.clear();
                }
                output.interrupted = true;
                continue;
            }

            while let Some(path) = pending.pop_front() {
                match job_tx.try_send(path) {
                    Ok(()) => *outstanding += 1,
                    Err(TrySendError::Full(path)) => {
                        pending.push_front(path);
                        break;
                    }
                    Err(TrySendError::Disconnected(path)) => {
                        log::error!(
                            "Walker: job queue disconnected, cannot list {}",
                            path.display()
                        );
                        break;
                    }
                }
            }
        }

        output.interrupted |= self.is_shutdown_requested();
        Ok(output)
    }
}

fn is_set(flag: Option<&AtomicBool>) -> bool {
    flag.is_some_and(|f| f.load(Ordering::SeqCst))
}

/// Validate the scan root; the only fatal errors of a walk come from here.
fn check_root(root: &Path) -> Result<(), ScanError> {
    let metadata = fs::metadata(root).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ScanError::NotFound(root.to_path_buf()),
        _ => ScanError::Io {
            path: root.to_path_buf(),
            source: e,
        },
    })?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

/// Worker loop: list directories until the job queue closes.
fn list_worker(jobs: &Receiver<PathBuf>, events: &Sender<WalkEvent>, shutdown: Option<&AtomicBool>) {
    for dir in jobs.iter() {
        if !is_set(shutdown) {
            list_directory(&dir, events);
        }
        if events.send(WalkEvent::Done).is_err() {
            return;
        }
    }
}

/// List one directory, reporting each relevant entry.
fn list_directory(dir: &Path, events: &Sender<WalkEvent>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            let _ = events.send(WalkEvent::Error(ScanError::from_io(dir.to_path_buf(), e)));
            return;
        }
    };

    for entry in entries {
        let event = match entry {
            Ok(entry) => match classify(&entry) {
                Some(event) => event,
                None => continue,
            },
            Err(e) => WalkEvent::Error(ScanError::from_io(dir.to_path_buf(), e)),
        };
        if events.send(event).is_err() {
            return;
        }
    }
}

/// Turn a directory entry into an event, or `None` if it is skipped.
fn classify(entry: &fs::DirEntry) -> Option<WalkEvent> {
    let path = entry.path();
    let file_type = match entry.file_type() {
        Ok(file_type) => file_type,
        Err(e) => return Some(WalkEvent::Error(ScanError::from_io(path, e))),
    };

    if file_type.is_dir() {
        return Some(WalkEvent::Directory(path));
    }
    if !file_type.is_file() {
        log::trace!("Skipping non-regular entry: {}", path.display());
        return None;
    }

    match entry.metadata() {
        Ok(metadata) if metadata.len() > 0 => Some(WalkEvent::File(FileRecord::new(
            path,
            metadata.len(),
        ))),
        Ok(_) => {
            log::trace!("Skipping empty file: {}", path.display());
            None
        }
        Err(e) => Some(WalkEvent::Error(ScanError::from_io(path, e))),
    }
}
