use filematch::duplicates::{DuplicateFinder, DuplicateGroup, FinderConfig};
use filematch::scanner::{DirectoryScanner, ScannerConfig};
use filematch::stats::StatsAggregator;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;
use walkdir::WalkDir;

fn finder(dir_workers: usize, hash_workers: usize, capacity: usize) -> DuplicateFinder {
    DuplicateFinder::new(
        FinderConfig::default()
            .with_dir_workers(dir_workers)
            .with_hash_workers(hash_workers)
            .with_queue_capacity(capacity),
    )
}

/// Groups as sorted path sets, independent of discovery order.
fn normalized(groups: &[DuplicateGroup]) -> BTreeSet<Vec<PathBuf>> {
    groups
        .iter()
        .map(|g| {
            let mut paths = g.paths();
            paths.sort();
            paths
        })
        .collect()
}

fn walk(root: &Path, workers: usize, capacity: usize) -> BTreeSet<(PathBuf, u64)> {
    let stats = Arc::new(StatsAggregator::new());
    let scanner = DirectoryScanner::new(ScannerConfig::new(workers, capacity), stats);
    scanner
        .scan(root)
        .unwrap()
        .files
        .into_iter()
        .map(|f| (f.path, f.size))
        .collect()
}

/// A mixed tree: nested directories, duplicates across directories, empty files.
fn build_mixed_tree(root: &Path) {
    for d in 0..5 {
        let dir = root.join(format!("dir{d}")).join("nested");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("shared.txt"), b"shared across every directory").unwrap();
        fs::write(dir.join(format!("own{d}.txt")), format!("unique {d}")).unwrap();
        File::create(dir.join("empty")).unwrap();
    }
    fs::write(root.join("top.bin"), vec![3u8; 10_000]).unwrap();
    fs::write(root.join("top-copy.bin"), vec![3u8; 10_000]).unwrap();
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.stats.files, 0);
    assert_eq!(summary.stats.directories, 1);
    assert_eq!(summary.stats.errors, 0);
}

#[test]
fn test_scan_excludes_empty_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("eight"), b"8").unwrap();
    File::create(dir.path().join("empty")).unwrap();

    let files = walk(dir.path(), 2, 4);
    assert_eq!(files.len(), 1);
    assert!(files.contains(&(dir.path().join("eight"), 1)));
}

#[test]
fn test_ten_identical_files_form_one_group() {
    let dir = tempdir().unwrap();
    for i in 0..10 {
        fs::write(dir.path().join(format!("copy{i}")), b"8").unwrap();
    }

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(summary.stats.size_candidates, 10);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 10);
    assert_eq!(groups[0].size, 1);
}

#[test]
fn test_one_byte_difference_is_excluded_by_prefix_stage() {
    let dir = tempdir().unwrap();
    for i in 0..9 {
        fs::write(dir.path().join(format!("copy{i}")), b"8").unwrap();
    }
    fs::write(dir.path().join("odd"), b"9").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(summary.stats.size_candidates, 10);
    assert_eq!(summary.stats.partial_candidates, 9);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 9);
    assert!(!groups[0].paths().contains(&dir.path().join("odd")));
}

#[test]
fn test_one_byte_difference_past_prefix_is_excluded_by_full_stage() {
    let dir = tempdir().unwrap();
    let content = vec![b'8'; 256];
    for i in 0..9 {
        fs::write(dir.path().join(format!("copy{i}")), &content).unwrap();
    }
    let mut odd = content.clone();
    odd[200] = b'9';
    fs::write(dir.path().join("odd"), &odd).unwrap();

    let finder = DuplicateFinder::new(FinderConfig::default().with_prefix_size(64));
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(summary.stats.partial_candidates, 10);
    assert_eq!(summary.stats.full_hashes, 10);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 9);
    assert!(!groups[0].paths().contains(&dir.path().join("odd")));
}

#[test]
fn test_hundred_by_hundred_unique_files() {
    let dir = tempdir().unwrap();
    for d in 0..100 {
        let sub = dir.path().join(format!("d{d:03}"));
        fs::create_dir(&sub).unwrap();
        for f in 0..100 {
            fs::write(sub.join(format!("f{f:03}")), format!("{d:03}-{f:03}")).unwrap();
        }
    }

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.stats.files, 10_000);
    assert_eq!(summary.stats.directories, 101);
    assert_eq!(summary.stats.errors, 0);
    assert_eq!(summary.stats.full_hashes, 0);
}

#[test]
fn test_scan_matches_reference_walker() {
    let dir = tempdir().unwrap();
    build_mixed_tree(dir.path());

    let expected_files: BTreeSet<(PathBuf, u64)> = WalkDir::new(dir.path())
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let len = e.metadata().ok()?.len();
            (len > 0).then(|| (e.path().to_path_buf(), len))
        })
        .collect();
    let expected_dirs = WalkDir::new(dir.path())
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
        .count() as u64;

    let stats = Arc::new(StatsAggregator::new());
    let scanner = DirectoryScanner::new(ScannerConfig::new(3, 2), Arc::clone(&stats));
    let found: BTreeSet<(PathBuf, u64)> = scanner
        .scan(dir.path())
        .unwrap()
        .files
        .into_iter()
        .map(|f| (f.path, f.size))
        .collect();

    assert_eq!(found, expected_files);
    assert_eq!(stats.snapshot().directories, expected_dirs);
}

#[test]
fn test_scan_is_idempotent_across_pool_sizes() {
    let dir = tempdir().unwrap();
    build_mixed_tree(dir.path());

    let single = walk(dir.path(), 1, 1);
    let wide = walk(dir.path(), 16, 64);
    let again = walk(dir.path(), 16, 64);

    assert_eq!(single, wide);
    assert_eq!(wide, again);
}

#[test]
fn test_groups_independent_of_pool_sizes() {
    let dir = tempdir().unwrap();
    build_mixed_tree(dir.path());

    let reference = {
        let (groups, _) = finder(1, 1, 1).find_duplicates(dir.path()).unwrap();
        normalized(&groups)
    };

    for (dirs, hashes, cap) in [(2, 3, 1), (10, 50, 100), (4, 1, 2)] {
        let (groups, _) = finder(dirs, hashes, cap).find_duplicates(dir.path()).unwrap();
        assert_eq!(normalized(&groups), reference);
    }

    assert_eq!(reference.len(), 2);
    assert!(reference.iter().any(|g| g.len() == 5));
    assert!(reference.iter().any(|g| g.len() == 2));
}

#[test]
fn test_prefix_covering_file_skips_second_read() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"short").unwrap();
    fs::write(dir.path().join("b"), b"short").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(summary.stats.full_hashes, 0);
    assert_eq!(summary.stats.full_hashes_reused, 2);
}
