//! Deterministic fake backends for demos and examples.
//!
//! Both fakes derive the same synthetic traffic shape from a seed, so the
//! columnar and range-query paths chart comparable data for the same
//! request without any real telemetry stack behind them.

use crate::backend::{ColumnarBackend, Granularity, QueryFilter, RangeQueryBackend};
use crate::core::types::RangeSeries;
use crate::core::{
    BucketAggregate, EndpointKey, MetricKind, Result, SamplePoint, TimeRange, WindowAggregate,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

/// Granularity of the synthetic traffic underlying window aggregates.
const SYNTH_STEP_MICROS: i64 = 60_000_000;

/// Synthetic traffic for one bucket: a diurnal base rate with jitter and
/// occasional gaps. Deterministic in (seed, bucket index, step).
fn synth_bucket(seed: u64, bucket_index: i64, step_micros: i64) -> Option<BucketAggregate> {
    let mut rng = StdRng::seed_from_u64(
        seed ^ (bucket_index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15),
    );
    if rng.gen::<f64>() < 0.04 {
        return None; // gap, exercises zero-fill downstream
    }
    let step_secs = step_micros as f64 / 1_000_000.0;
    let hour = (bucket_index * step_micros).rem_euclid(86_400_000_000) as f64 / 3_600_000_000.0;
    let rate = 6.0 + 4.0 * (hour / 24.0 * std::f64::consts::TAU).sin();
    let total = (rate * step_secs * rng.gen_range(0.85..1.15)).round() as u64;
    if total == 0 {
        return None;
    }
    let errors = (total as f64 * rng.gen_range(0.0..0.03)).round() as u64;
    let avg_latency_micros = rng.gen_range(9_000.0..22_000.0);
    Some(BucketAggregate {
        bucket_index,
        total_count: total,
        total_error_count: errors.min(total),
        total_duration_micros: (total as f64 * avg_latency_micros) as u64,
    })
}

/// Sums synthetic traffic over a window at the internal granularity.
fn synth_window(seed: u64, range: &TimeRange) -> WindowAggregate {
    let mut agg = WindowAggregate::empty(range.duration_micros());
    let start = range.start_micros().div_euclid(SYNTH_STEP_MICROS);
    let end = range.end_micros().div_euclid(SYNTH_STEP_MICROS);
    for index in start..=end {
        if let Some(bucket) = synth_bucket(seed, index, SYNTH_STEP_MICROS) {
            agg.add_bucket(&bucket);
        }
    }
    agg
}

/// Fake pre-aggregated columnar store.
pub struct FakeColumnarBackend {
    seed: u64,
}

impl FakeColumnarBackend {
    /// Creates a fake columnar backend with the given traffic seed.
    pub fn new(seed: u64) -> Self {
        FakeColumnarBackend { seed }
    }
}

#[async_trait::async_trait]
impl ColumnarBackend for FakeColumnarBackend {
    async fn query_bucket_aggregates(
        &self,
        range: &TimeRange,
        _key: &EndpointKey,
        step_micros: i64,
    ) -> Result<Vec<BucketAggregate>> {
        let start = range.start_micros().div_euclid(step_micros);
        let end = range.end_micros().div_euclid(step_micros);
        Ok((start..=end)
            .filter_map(|index| synth_bucket(self.seed, index, step_micros))
            .collect())
    }

    async fn query_window_aggregate(
        &self,
        range: &TimeRange,
        _key: &EndpointKey,
    ) -> Result<WindowAggregate> {
        Ok(synth_window(self.seed, range))
    }
}

/// Fake range-query time-series store. Returned series echo the request
/// filter as their label set, so identity rematching succeeds.
pub struct FakeRangeQueryBackend {
    seed: u64,
}

impl FakeRangeQueryBackend {
    /// Creates a fake range-query backend with the given traffic seed.
    pub fn new(seed: u64) -> Self {
        FakeRangeQueryBackend { seed }
    }

    /// Backend-native value for one synthetic bucket.
    fn native_value(kind: MetricKind, bucket: &BucketAggregate, step_micros: i64) -> f64 {
        let count = bucket.total_count as f64;
        match kind {
            MetricKind::Latency => bucket.total_duration_micros as f64 / count,
            MetricKind::ErrorRate => bucket.total_error_count as f64 / count,
            MetricKind::Throughput => count / (step_micros as f64 / 1_000_000.0),
        }
    }
}

#[async_trait::async_trait]
impl RangeQueryBackend for FakeRangeQueryBackend {
    async fn query_range(
        &self,
        kind: MetricKind,
        range: &TimeRange,
        step_micros: i64,
        _granularity: Granularity,
        filter: &QueryFilter,
    ) -> Result<Vec<RangeSeries>> {
        let mut labels = FxHashMap::default();
        for m in filter.matches() {
            labels.insert(m.key.clone(), m.value.clone());
        }

        let start = range.start_micros().div_euclid(step_micros);
        let end = range.end_micros().div_euclid(step_micros);
        let samples = (start..=end)
            .filter_map(|index| {
                let bucket = synth_bucket(self.seed, index, step_micros)?;
                Some(SamplePoint {
                    timestamp_micros: index * step_micros,
                    value: Self::native_value(kind, &bucket, step_micros),
                })
            })
            .collect();

        Ok(vec![RangeSeries { labels, samples }])
    }

    async fn query_scalar(
        &self,
        kind: MetricKind,
        window: &TimeRange,
        _filter: &QueryFilter,
    ) -> Result<Option<f64>> {
        let agg = synth_window(self.seed, window);
        if agg.total_count == 0 {
            return Ok(None);
        }
        let value = match kind {
            MetricKind::Latency => agg.avg_latency_micros(),
            MetricKind::ErrorRate => {
                agg.total_error_count as f64 / agg.total_count as f64
            },
            MetricKind::Throughput => {
                agg.total_count as f64 / (window.duration_micros() as f64 / 1_000_000.0)
            },
        };
        Ok(Some(value))
    }
}
