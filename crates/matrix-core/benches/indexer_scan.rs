#![allow(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

//! Benchmark the indexer's filesystem scan and a single language parser's
//! tree-sitter pass (§4.8–§4.9), independent of any store round-trip.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use matrix_core::index::languages;
use matrix_core::index::scan::{self, ScanOptions};

fn write_rust_tree(root: &std::path::Path, file_count: usize) {
    for i in 0..file_count {
        let dir = root.join(format!("module_{}", i % 20));
        std::fs::create_dir_all(&dir).expect("create module dir");
        std::fs::write(
            dir.join(format!("file_{i}.rs")),
            format!(
                "pub fn handler_{i}(input: &str) -> String {{\n    input.to_uppercase()\n}}\n\nstruct State_{i} {{\n    count: u32,\n}}\n"
            ),
        )
        .expect("write fixture file");
    }
}

fn bench_scan_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_tree");
    for size in [50, 500, 2000] {
        let dir = tempfile::tempdir().expect("tempdir");
        write_rust_tree(dir.path(), size);
        let extensions = languages::all_extensions();

        group.bench_with_input(BenchmarkId::from_parameter(size), dir.path(), |b, root| {
            b.iter(|| {
                let scanned = scan::scan(root, &extensions, ScanOptions::default());
                black_box(scanned);
            });
        });
    }
    group.finish();
}

fn bench_rust_parse(c: &mut Criterion) {
    let parser = languages::parser_for("rs").expect("rust parser registered");

    let mut group = c.benchmark_group("rust_parse");
    for function_count in [10, 100, 1000] {
        let source: String = (0..function_count)
            .map(|i| format!("pub fn handler_{i}(input: &str) -> String {{ input.to_uppercase() }}\n"))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(function_count), &source, |b, source| {
            b.iter(|| {
                let result = parser.parse(black_box(source));
                black_box(result);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scan_tree, bench_rust_parse);
criterion_main!(benches);
