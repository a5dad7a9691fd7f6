//! Benchmarks for the version policy.
//!
//! A fleet release computes versions and scans tag lists for every
//! repository, so these run once per booster on each release.

use booster_release::catalog;
use booster_release::version;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_next_booster_version(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_booster_version");
    for current in ["2.2.5-2-SNAPSHOT", "2.2.5-2-redhat", "2.3.0-9", "2.2.5.Final"] {
        group.bench_with_input(BenchmarkId::from_parameter(current), current, |b, current| {
            b.iter(|| version::next_booster_version(black_box(current)))
        });
    }
    group.finish();
}

fn bench_next_bom_version(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_bom_version");
    for released in ["1.5.15.Final", "1.5.15.SP2", "1.5.15.Beta2"] {
        group.bench_with_input(BenchmarkId::from_parameter(released), released, |b, released| {
            b.iter(|| version::next_bom_version(black_box("1.5.15-SNAPSHOT"), black_box(released)))
        });
    }
    group.finish();
}

fn tag_list(count: usize) -> Vec<String> {
    (1..=count)
        .flat_map(|revision| {
            [
                format!("2.2.5-{}", revision),
                format!("2.2.5-{}-redhat", revision),
                format!("2.1.13-{}", revision),
            ]
        })
        .collect()
}

fn bench_latest_tags(c: &mut Criterion) {
    let mut group = c.benchmark_group("latest_tags");
    for count in [10usize, 100, 1000] {
        let tags = tag_list(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &tags, |b, tags| {
            b.iter(|| catalog::latest_tags(black_box(tags), "2.2.5.RELEASE", "redhat"))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_next_booster_version,
    bench_next_bom_version,
    bench_latest_tags
);
criterion_main!(benches);
