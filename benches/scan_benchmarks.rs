use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use filematch::duplicates::{DuplicateFinder, FinderConfig};
use filematch::scanner::{DirectoryScanner, Hasher, ScannerConfig};
use filematch::stats::StatsAggregator;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Build a tree `levels` deep with three subdirectories per level and
/// `per_dir` small, distinct files in every directory.
fn build_tree(levels: usize, per_dir: usize) -> TempDir {
    let root = TempDir::new().unwrap();
    populate(root.path(), levels, per_dir);
    root
}

fn populate(dir: &Path, levels: usize, per_dir: usize) {
    fs::create_dir_all(dir).unwrap();
    for n in 0..per_dir {
        let body = format!("{}#{n}", dir.display());
        fs::write(dir.join(format!("f{n:03}.dat")), body).unwrap();
    }
    if levels > 1 {
        for sub in ["a", "b", "c"] {
            populate(&dir.join(sub), levels - 1, per_dir);
        }
    }
}

fn bench_listing(c: &mut Criterion) {
    // 121 directories, 1210 files.
    let tree = build_tree(5, 10);
    let mut group = c.benchmark_group("listing");

    for workers in [1usize, 4, 10] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &w| {
            b.iter(|| {
                let scanner =
                    DirectoryScanner::new(ScannerConfig::new(w, 100), Arc::new(StatsAggregator::new()));
                black_box(scanner.scan(tree.path()).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashing");
    let hasher = Hasher::new();
    let scratch = TempDir::new().unwrap();

    for kib in [1usize, 1024, 10240] {
        let path = scratch.path().join(format!("{kib}.bin"));
        fs::write(&path, vec![0x5au8; kib * 1024]).unwrap();
        let size = (kib * 1024) as u64;

        group.bench_with_input(BenchmarkId::new("prefix", kib), &path, |b, p| {
            b.iter(|| black_box(hasher.prefix_hash(p).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("full", kib), &path, |b, p| {
            b.iter(|| black_box(hasher.full_hash(p, size).unwrap()))
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    // 13 directories plus nine copies of one file in the root.
    let tree = build_tree(3, 10);
    let original = tree.path().join("f000.dat");
    for n in 1..10 {
        fs::copy(&original, tree.path().join(format!("copy{n}.dat"))).unwrap();
    }

    let finder = DuplicateFinder::new(FinderConfig::default().with_hash_workers(8));
    c.bench_function("end_to_end", |b| {
        b.iter(|| black_box(finder.find_duplicates(tree.path()).unwrap()))
    });
}

criterion_group!(benches, bench_listing, bench_hashing, bench_end_to_end);
criterion_main!(benches);
