use filematch::duplicates::{DuplicateFinder, FinderError};
use filematch::scanner::{FileRecord, ScanError};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_missing_files_are_counted_and_dropped() {
    let finder = DuplicateFinder::with_defaults();
    // Same size, so both reach the prefix stage.
    let file1 = FileRecord::new(PathBuf::from("nonexistent_1.txt"), 100);
    let file2 = FileRecord::new(PathBuf::from("nonexistent_2.txt"), 100);

    let (groups, interrupted) = finder.find_duplicates_in_files(vec![file1, file2]);

    assert!(groups.is_empty());
    assert!(!interrupted);
    assert_eq!(finder.stats().snapshot().errors, 2);
}

#[test]
fn test_missing_file_does_not_hide_other_duplicates() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"same content").unwrap();
    fs::write(&b, b"same content").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates_in_files(vec![
        FileRecord::new(a.clone(), 12),
        FileRecord::new(dir.path().join("vanished"), 12),
        FileRecord::new(b.clone(), 12),
    ]);

    assert_eq!(groups.len(), 1);
    let mut paths = groups[0].paths();
    paths.sort();
    assert_eq!(paths, vec![a, b]);
    assert_eq!(finder.stats().snapshot().errors, 1);
}

#[test]
fn test_file_changed_between_walk_and_hash() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    let c = dir.path().join("c");
    for path in [&a, &b, &c] {
        fs::write(path, b"original").unwrap();
    }
    // `c` grows after it was "discovered" with 8 bytes.
    fs::write(&c, b"original plus more").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates_in_files(vec![
        FileRecord::new(a, 8),
        FileRecord::new(b, 8),
        FileRecord::new(c.clone(), 8),
    ]);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert!(!groups[0].paths().contains(&c));
}

#[test]
fn test_root_errors_are_fatal() {
    let finder = DuplicateFinder::with_defaults();

    let missing = finder.find_duplicates(std::path::Path::new("/nonexistent/filematch/root"));
    assert!(matches!(
        missing,
        Err(FinderError::Scan(ScanError::NotFound(_)))
    ));

    let dir = tempdir().unwrap();
    let file = dir.path().join("plain");
    fs::write(&file, b"x").unwrap();
    let not_dir = finder.find_duplicates(&file);
    assert!(matches!(
        not_dir,
        Err(FinderError::Scan(ScanError::NotADirectory(_)))
    ));
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_counts_one_error() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"dup").unwrap();
    fs::write(dir.path().join("b"), b"dup").unwrap();

    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("hidden"), b"dup").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can list the directory anyway.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates(dir.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let (groups, summary) = result.unwrap();
    assert_eq!(summary.stats.errors, 1);
    assert_eq!(summary.stats.directories, 2);
    assert_eq!(summary.stats.files, 2);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_counts_one_error() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"dup").unwrap();
    fs::write(dir.path().join("b"), b"dup").unwrap();
    let secret = dir.path().join("secret");
    fs::write(&secret, b"dup").unwrap();
    fs::set_permissions(&secret, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::File::open(&secret).is_ok() {
        return;
    }

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(summary.stats.files, 3);
    assert_eq!(summary.stats.errors, 1);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert!(!groups[0].paths().contains(&secret));
}
