//! Chart assembly: two source strategies behind one contract.
//!
//! Each strategy turns one request into the three RED charts. Whatever the
//! source, the output shape is identical: a zero-filled bucket grid with
//! real values overlaid, a window value, and nil-safe comparison ratios —
//! callers stay source-agnostic.

pub mod ratio;

use crate::backend::range_query::MetricFetch;
use crate::backend::{ColumnarAdapter, RangeQueryAdapter};
use crate::bucket::BucketRange;
use crate::core::config::ComparisonConfig;
use crate::core::types::MICROS_PER_MINUTE;
use crate::core::{
    ChartPoints, ChartResult, ComparisonTriple, EndpointKey, MetricKind, Ratio, Result,
    SamplePoint, SourceKind, TimeRange, Timeseries, WindowAggregate,
};
use self::ratio::ratio;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// One resolved chart request: identity, window, and bucket width.
#[derive(Debug, Clone)]
pub struct ChartRequest {
    /// Target identity.
    pub key: EndpointKey,
    /// Validated request window.
    pub range: TimeRange,
    /// Bucket width selected by the step policy.
    pub step_micros: i64,
}

/// A source-specific assembly strategy. Both implementations must satisfy
/// the same output-shape invariants; drift between them is caught by the
/// shared contract suite in `tests/`.
#[async_trait::async_trait]
pub trait ChartStrategy: Send + Sync {
    /// Which source this strategy reads from.
    fn source_kind(&self) -> SourceKind;

    /// Assembles the three RED charts for one request.
    async fn assemble(&self, request: &ChartRequest) -> Result<Vec<ChartResult>>;
}

/// Overlays range samples onto a zero-filled chart. Each sample lands in
/// the bucket containing its timestamp; samples outside the window are
/// dropped, and a later sample in the same bucket wins.
fn overlay_samples(chart: &mut ChartPoints, buckets: &BucketRange, samples: &[SamplePoint]) {
    for sample in samples {
        let index = buckets.bucket_index(sample.timestamp_micros);
        if buckets.contains(index) {
            chart.insert(buckets.bucket_start_micros(index), sample.value);
        }
    }
}

/// Builds the single-series chart for one metric kind.
fn build_chart(
    kind: MetricKind,
    key: &EndpointKey,
    chart_data: ChartPoints,
    triple: ComparisonTriple,
    source: Option<SourceKind>,
) -> ChartResult {
    let mut labels = BTreeMap::new();
    if let Some(source) = source {
        labels.insert("source".to_string(), source.as_str().to_string());
    }
    labels.insert("service".to_string(), key.service().to_string());
    labels.insert("endpoint".to_string(), key.endpoint().to_string());

    ChartResult {
        title: kind.title().to_string(),
        unit: kind.unit().to_string(),
        timeseries: vec![Timeseries {
            legend: key.service().to_string(),
            labels,
            chart_data,
            ratio: Ratio {
                day_over_day: triple.day_over_day,
                week_over_week: triple.week_over_week,
            },
            value: triple.current,
        }],
    }
}

/// Assembles charts from pre-aggregated columnar bucket rows.
pub struct ColumnarStrategy {
    adapter: ColumnarAdapter,
    comparison: ComparisonConfig,
}

impl ColumnarStrategy {
    /// Creates the strategy from its adapter and comparison offsets.
    pub fn new(adapter: ColumnarAdapter, comparison: ComparisonConfig) -> Self {
        ColumnarStrategy {
            adapter,
            comparison,
        }
    }
}

#[async_trait::async_trait]
impl ChartStrategy for ColumnarStrategy {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Columnar
    }

    async fn assemble(&self, request: &ChartRequest) -> Result<Vec<ChartResult>> {
        let buckets = BucketRange::new(&request.range, request.step_micros);
        let fetch = self
            .adapter
            .fetch(&request.key, &request.range, request.step_micros, &self.comparison)
            .await?;

        let by_index: FxHashMap<i64, _> = fetch
            .buckets
            .iter()
            .map(|row| (row.bucket_index, *row))
            .collect();

        let mut latency_chart = buckets.zero_filled();
        let mut error_chart = buckets.zero_filled();
        let mut throughput_chart = buckets.zero_filled();
        let mut current = WindowAggregate::empty(request.range.duration_micros());

        for index in buckets.start_bucket()..=buckets.end_bucket() {
            let Some(row) = by_index.get(&index) else {
                continue; // absent bucket keeps its zero fill
            };
            if row.total_count == 0 {
                continue;
            }
            let ts = buckets.bucket_start_micros(index);
            let count = row.total_count as f64;
            latency_chart.insert(ts, row.total_duration_micros as f64 / count);
            error_chart.insert(ts, 100.0 * row.total_error_count as f64 / count);
            throughput_chart
                .insert(ts, count * MICROS_PER_MINUTE as f64 / request.step_micros as f64);
            current.add_bucket(row);
        }

        let day = fetch.day_reference;
        let week = fetch.week_reference;

        let latency = current.avg_latency_micros();
        let error_rate = current.error_rate_percent();
        let throughput = current.throughput_per_minute();

        Ok(vec![
            build_chart(
                MetricKind::Latency,
                &request.key,
                latency_chart,
                ComparisonTriple {
                    current: latency,
                    day_over_day: ratio(latency, day.map(|w| w.avg_latency_micros())),
                    week_over_week: ratio(latency, week.map(|w| w.avg_latency_micros())),
                },
                None,
            ),
            build_chart(
                MetricKind::ErrorRate,
                &request.key,
                error_chart,
                ComparisonTriple {
                    current: error_rate,
                    day_over_day: ratio(error_rate, day.map(|w| w.error_rate_percent())),
                    week_over_week: ratio(error_rate, week.map(|w| w.error_rate_percent())),
                },
                None,
            ),
            build_chart(
                MetricKind::Throughput,
                &request.key,
                throughput_chart,
                ComparisonTriple {
                    current: throughput,
                    day_over_day: ratio(throughput, day.map(|w| w.throughput_per_minute())),
                    week_over_week: ratio(throughput, week.map(|w| w.throughput_per_minute())),
                },
                None,
            ),
        ])
    }
}

/// Assembles charts from range-query series and scalar aggregates.
pub struct RangeQueryStrategy {
    adapter: RangeQueryAdapter,
    comparison: ComparisonConfig,
}

impl RangeQueryStrategy {
    /// Creates the strategy from its adapter and comparison offsets.
    pub fn new(adapter: RangeQueryAdapter, comparison: ComparisonConfig) -> Self {
        RangeQueryStrategy {
            adapter,
            comparison,
        }
    }
}

#[async_trait::async_trait]
impl ChartStrategy for RangeQueryStrategy {
    fn source_kind(&self) -> SourceKind {
        SourceKind::RangeQuery
    }

    async fn assemble(&self, request: &ChartRequest) -> Result<Vec<ChartResult>> {
        let buckets = BucketRange::new(&request.range, request.step_micros);
        let fetch = self
            .adapter
            .fetch(&request.key, &request.range, request.step_micros, &self.comparison)
            .await?;

        let mut results = Vec::with_capacity(MetricKind::ALL.len());
        for kind in MetricKind::ALL {
            let metric: &MetricFetch = fetch.for_kind(kind);
            let mut chart = buckets.zero_filled();
            overlay_samples(&mut chart, &buckets, &metric.samples);

            // A present-but-zero value stays 0.0; only a missing current
            // value suppresses the ratios entirely.
            let current = metric.scalars.current;
            let triple = ComparisonTriple {
                current: current.unwrap_or(0.0),
                day_over_day: current.and_then(|c| ratio(c, metric.scalars.day_reference)),
                week_over_week: current.and_then(|c| ratio(c, metric.scalars.week_reference)),
            };
            results.push(build_chart(
                kind,
                &request.key,
                chart,
                triple,
                Some(SourceKind::RangeQuery),
            ));
        }
        Ok(results)
    }
}
