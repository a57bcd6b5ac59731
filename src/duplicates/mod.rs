//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping (no I/O)
//! - Prefix hash comparison
//! - Full hash comparison
//! - Duplicate group management

pub mod finder;
pub mod groups;

pub use finder::{
    full_hash_stage, partial_hash_stage, promote, DuplicateFinder, FinderConfig,
    FinderError, ScanSummary, StageOutput,
};
pub use groups::{bucket_by_size, group_by_digest, BucketStats, DuplicateGroup, MIN_GROUP_SIZE};
