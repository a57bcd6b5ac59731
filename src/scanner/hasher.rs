//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! [`Hasher`] computes the two digests the matching pipeline needs:
//!
//! - [`Hasher::prefix_hash`]: digest over at most `prefix_size` leading bytes
//! - [`Hasher::full_hash`]: digest over the whole file
//!
//! Both stream the file through the BLAKE3 hasher, so memory use does not
//! depend on file size. Each call opens the file, reads it and drops the
//! handle before returning, on success and on every error path.
//!
//! Because both digests use the same hash function, the prefix digest of a
//! file no longer than `prefix_size` equals its full digest.
//!
//! # Example
//!
//! ```no_run
//! use filematch::scanner::Hasher;
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let prefix = hasher.prefix_hash(Path::new("a.bin")).unwrap();
//! let full = hasher.full_hash(Path::new("a.bin"), 1024).unwrap();
//! println!("{} {}", filematch::scanner::hash_to_hex(&prefix.hash), prefix.bytes_read);
//! println!("{}", filematch::scanner::hash_to_hex(&full));
//! ```

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::HashError;

/// 256-bit content digest.
pub type Hash = [u8; 32];

/// Default number of leading bytes digested by the prefix stage (64 KiB).
pub const DEFAULT_PREFIX_SIZE: u64 = 64 * 1024;

/// Result of hashing a file prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixDigest {
    /// Digest over the bytes read
    pub hash: Hash,
    /// Number of bytes read (never more than the prefix size)
    pub bytes_read: u64,
}

/// Streaming BLAKE3 file hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    prefix_size: u64,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default prefix size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefix_size: DEFAULT_PREFIX_SIZE,
        }
    }

    /// Set the number of leading bytes digested by [`Hasher::prefix_hash`].
    #[must_use]
    pub fn with_prefix_size(mut self, prefix_size: u64) -> Self {
        self.prefix_size = prefix_size.max(1);
        self
    }

    /// Number of leading bytes digested by [`Hasher::prefix_hash`].
    #[must_use]
    pub fn prefix_size(&self) -> u64 {
        self.prefix_size
    }

    /// Digest the first `prefix_size` bytes of a file.
    ///
    /// Files shorter than the prefix are digested completely.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::EmptyRead`] when the read yields no data, and an
    /// open or read failure otherwise.
    pub fn prefix_hash(&self, path: &Path) -> Result<PrefixDigest, HashError> {
        let file = open(path)?;
        let mut hasher = blake3::Hasher::new();
        let bytes_read = io::copy(&mut file.take(self.prefix_size), &mut hasher)
            .map_err(|e| HashError::from_io(path.to_path_buf(), e))?;

        if bytes_read == 0 {
            return Err(HashError::EmptyRead(path.to_path_buf()));
        }

        Ok(PrefixDigest {
            hash: *hasher.finalize().as_bytes(),
            bytes_read,
        })
    }

    /// Digest the entire content of a file.
    ///
    /// # Arguments
    ///
    /// * `path` - File to hash
    /// * `expected_len` - Size recorded when the file was discovered
    ///
    /// # Errors
    ///
    /// Returns [`HashError::SizeChanged`] if the number of bytes digested is
    /// not `expected_len`, and an open or read failure otherwise.
    pub fn full_hash(&self, path: &Path, expected_len: u64) -> Result<Hash, HashError> {
        let mut file = open(path)?;
        let mut hasher = blake3::Hasher::new();
        let bytes_read = io::copy(&mut file, &mut hasher)
            .map_err(|e| HashError::from_io(path.to_path_buf(), e))?;

        if bytes_read != expected_len {
            return Err(HashError::SizeChanged {
                path: path.to_path_buf(),
                expected: expected_len,
                actual: bytes_read,
            });
        }

        Ok(*hasher.finalize().as_bytes())
    }
}

fn open(path: &Path) -> Result<File, HashError> {
    File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))
}

/// Convert a hash to a lowercase hexadecimal string.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from(*hash).to_hex().to_string()
}
