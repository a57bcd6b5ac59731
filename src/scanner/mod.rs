//! File discovery and hashing.
//!
//! [`walker`] lists the tree with a bounded pool of threads and produces
//! [`FileRecord`]s; [`hasher`] computes the prefix and full BLAKE3 digests
//! the matching stages attach to them. Errors from either side are per path:
//! the caller decides whether one is fatal (the scan root) or is counted and
//! skipped (everything below it).
//!
//! # Example
//!
//! ```no_run
//! use filematch::scanner::{DirectoryScanner, ScannerConfig};
//! use filematch::stats::StatsAggregator;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let stats = Arc::new(StatsAggregator::new());
//! let scanner = DirectoryScanner::new(ScannerConfig::default(), stats);
//!
//! let output = scanner.scan(Path::new(".")).unwrap();
//! for file in &output.files {
//!     println!("{}: {} bytes", file.path.display(), file.size);
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::PathBuf;

pub use hasher::{hash_to_hex, Hash, Hasher, PrefixDigest, DEFAULT_PREFIX_SIZE};
pub use walker::{DirectoryScanner, WalkOutput};

/// Which digest of a [`FileRecord`] a grouping step looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Digest over the first bytes of the file
    Partial,
    /// Digest over the entire file
    Full,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Partial => write!(f, "partial"),
            Stage::Full => write!(f, "full"),
        }
    }
}

/// One regular file discovered by the scanner.
///
/// The size is fixed at discovery time. Digests are attached by the hashing
/// stages, each of which takes the record by value and hands back an updated
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path to the file (relative if the scan root was relative)
    pub path: PathBuf,
    /// File size in bytes at discovery
    pub size: u64,
    /// Digest over the first `partial_len` bytes
    pub partial_hash: Option<Hash>,
    /// Number of bytes read for `partial_hash`
    pub partial_len: Option<u64>,
    /// Digest over the whole content
    pub full_hash: Option<Hash>,
}

impl FileRecord {
    /// A record with no digests attached yet.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            partial_hash: None,
            partial_len: None,
            full_hash: None,
        }
    }

    /// Attach the prefix digest and the number of bytes it covers.
    #[must_use]
    pub fn with_partial(mut self, hash: Hash, bytes_read: u64) -> Self {
        self.partial_hash = Some(hash);
        self.partial_len = Some(bytes_read);
        self
    }

    /// Attach the full-content digest.
    #[must_use]
    pub fn with_full(mut self, hash: Hash) -> Self {
        self.full_hash = Some(hash);
        self
    }

    /// The digest for the given stage, if computed.
    #[must_use]
    pub fn digest(&self, stage: Stage) -> Option<Hash> {
        match stage {
            Stage::Partial => self.partial_hash,
            Stage::Full => self.full_hash,
        }
    }

    /// Whether the prefix digest already covers every byte of the file.
    #[must_use]
    pub fn partial_covers_file(&self) -> bool {
        self.partial_hash.is_some() && self.partial_len == Some(self.size)
    }
}

/// Walker pool shape.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Number of concurrent directory-listing workers.
    pub workers: usize,

    /// Capacity of the channel carrying discoveries back to the coordinator.
    pub event_capacity: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            event_capacity: 100,
        }
    }
}

impl ScannerConfig {
    /// Both values are raised to at least 1.
    #[must_use]
    pub fn new(workers: usize, event_capacity: usize) -> Self {
        Self {
            workers: workers.max(1),
            event_capacity: event_capacity.max(1),
        }
    }
}

/// A path the walker could not use.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Only raised for the scan root.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Map an I/O failure on `path` to the matching variant.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match error.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io { path, source: error },
        }
    }
}

/// A file that could not be digested; it drops out of matching.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// Removed between discovery and hashing.
    #[error("Vanished before hashing: {0}")]
    NotFound(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The prefix read came back empty.
    #[error("Read returned no data: {0}")]
    EmptyRead(PathBuf),

    /// The whole-file read disagrees with the size seen at discovery.
    #[error("Size changed during scan for {path}: expected {expected} bytes, read {actual}")]
    SizeChanged {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Map an I/O failure on `path` to the matching variant.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match error.kind() {
            ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io { path, source: error },
        }
    }
}
