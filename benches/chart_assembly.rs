//! Chart assembly benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use redchart_lib::backend::fake::{FakeColumnarBackend, FakeRangeQueryBackend};
use redchart_lib::bucket::BucketRange;
use redchart_lib::core::{Config, EndpointKey, SourcePreference, TimeRange};
use redchart_lib::engine::RedChartEngine;
use std::sync::Arc;

const DAY_MICROS: i64 = 24 * 3_600_000_000;

fn bench_zero_fill(c: &mut Criterion) {
    let range = TimeRange::new(0, DAY_MICROS).unwrap();
    let buckets = BucketRange::new(&range, 60_000_000);

    c.bench_function("zero_fill_day_of_minutes", |b| {
        b.iter(|| black_box(buckets.zero_filled()))
    });
}

fn bench_assembly(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let engine = RedChartEngine::new(
        Config::default(),
        Arc::new(FakeColumnarBackend::new(7)),
        Arc::new(FakeRangeQueryBackend::new(7)),
    )
    .unwrap();
    let key = EndpointKey::new("checkout".to_string(), "/api/pay".to_string()).unwrap();

    let mut group = c.benchmark_group("red_charts_day_window");
    for (name, preference) in [
        ("columnar", SourcePreference::Columnar),
        ("range_query", SourcePreference::RangeQuery),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                rt.block_on(engine.compute_red_charts(
                    black_box(&key),
                    0,
                    DAY_MICROS,
                    Some(preference),
                ))
                .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_zero_fill, bench_assembly);
criterion_main!(benches);
