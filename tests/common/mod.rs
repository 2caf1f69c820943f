//! Common test utilities and fixtures.

use redchart_lib::backend::{ColumnarBackend, Granularity, QueryFilter, RangeQueryBackend};
use redchart_lib::core::types::RangeSeries;
use redchart_lib::core::{
    BucketAggregate, ChartError, Config, EndpointKey, MetricKind, Result, SamplePoint, SourceKind,
    TimeRange, WindowAggregate,
};
use redchart_lib::engine::RedChartEngine;
use rustc_hash::FxHashMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub const MINUTE_MICROS: i64 = 60_000_000;
pub const HOUR_MICROS: i64 = 3_600_000_000;
pub const DAY_MICROS: i64 = 24 * HOUR_MICROS;
pub const WEEK_MICROS: i64 = 7 * DAY_MICROS;

/// The identity every fixture request targets.
pub fn key() -> EndpointKey {
    EndpointKey::new("checkout".to_string(), "/api/pay".to_string()).unwrap()
}

/// Label set matching [`key`] under the default label configuration.
pub fn identity_labels() -> FxHashMap<String, String> {
    let mut labels = FxHashMap::default();
    labels.insert("svc_name".to_string(), "checkout".to_string());
    labels.insert("content_key".to_string(), "/api/pay".to_string());
    labels
}

/// Builds a labeled range series from (timestamp, value) pairs.
pub fn series(labels: FxHashMap<String, String>, samples: &[(i64, f64)]) -> RangeSeries {
    RangeSeries {
        labels,
        samples: samples
            .iter()
            .map(|(ts, value)| SamplePoint {
                timestamp_micros: *ts,
                value: *value,
            })
            .collect(),
    }
}

/// Builds one columnar bucket row.
pub fn row(bucket_index: i64, count: u64, errors: u64, duration_micros: u64) -> BucketAggregate {
    BucketAggregate {
        bucket_index,
        total_count: count,
        total_error_count: errors,
        total_duration_micros: duration_micros,
    }
}

/// Builds a whole-window aggregate.
pub fn window(count: u64, errors: u64, duration_micros: u64, window_micros: i64) -> WindowAggregate {
    WindowAggregate {
        total_count: count,
        total_error_count: errors,
        total_duration_micros: duration_micros,
        window_duration_micros: window_micros,
    }
}

/// Programmable columnar backend double.
#[derive(Default)]
pub struct MockColumnarBackend {
    rows: Vec<BucketAggregate>,
    day_window: Option<WindowAggregate>,
    week_window: Option<WindowAggregate>,
    fail_buckets: bool,
    fail_day: bool,
    fail_week: bool,
}

impl MockColumnarBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, rows: Vec<BucketAggregate>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_day_window(mut self, agg: WindowAggregate) -> Self {
        self.day_window = Some(agg);
        self
    }

    pub fn with_week_window(mut self, agg: WindowAggregate) -> Self {
        self.week_window = Some(agg);
        self
    }

    pub fn failing_buckets(mut self) -> Self {
        self.fail_buckets = true;
        self
    }

    pub fn failing_day(mut self) -> Self {
        self.fail_day = true;
        self
    }

    pub fn failing_week(mut self) -> Self {
        self.fail_week = true;
        self
    }
}

#[async_trait::async_trait]
impl ColumnarBackend for MockColumnarBackend {
    async fn query_bucket_aggregates(
        &self,
        _range: &TimeRange,
        _key: &EndpointKey,
        _step_micros: i64,
    ) -> Result<Vec<BucketAggregate>> {
        if self.fail_buckets {
            return Err(ChartError::backend(SourceKind::Columnar, "bucket query refused"));
        }
        Ok(self.rows.clone())
    }

    async fn query_window_aggregate(
        &self,
        range: &TimeRange,
        _key: &EndpointKey,
    ) -> Result<WindowAggregate> {
        // The adapter issues the two reference windows with the configured
        // offsets as their lengths; classify by duration.
        let duration = range.duration_micros();
        if duration == DAY_MICROS {
            if self.fail_day {
                return Err(ChartError::backend(SourceKind::Columnar, "day window refused"));
            }
            Ok(self
                .day_window
                .unwrap_or_else(|| WindowAggregate::empty(duration)))
        } else {
            if self.fail_week {
                return Err(ChartError::backend(SourceKind::Columnar, "week window refused"));
            }
            Ok(self
                .week_window
                .unwrap_or_else(|| WindowAggregate::empty(duration)))
        }
    }
}

/// Programmable range-query backend double. Scalar windows are classified
/// against the request start it was built with.
pub struct MockRangeQueryBackend {
    base_start: i64,
    series: HashMap<MetricKind, Vec<RangeSeries>>,
    fail_range: HashSet<MetricKind>,
    current: HashMap<MetricKind, f64>,
    day: HashMap<MetricKind, f64>,
    week: HashMap<MetricKind, f64>,
    fail_current_scalar: bool,
    fail_day_scalar: bool,
    fail_week_scalar: bool,
}

impl MockRangeQueryBackend {
    pub fn new(base_start: i64) -> Self {
        MockRangeQueryBackend {
            base_start,
            series: HashMap::new(),
            fail_range: HashSet::new(),
            current: HashMap::new(),
            day: HashMap::new(),
            week: HashMap::new(),
            fail_current_scalar: false,
            fail_day_scalar: false,
            fail_week_scalar: false,
        }
    }

    pub fn with_series(mut self, kind: MetricKind, list: Vec<RangeSeries>) -> Self {
        self.series.insert(kind, list);
        self
    }

    pub fn with_current(mut self, kind: MetricKind, value: f64) -> Self {
        self.current.insert(kind, value);
        self
    }

    pub fn with_day(mut self, kind: MetricKind, value: f64) -> Self {
        self.day.insert(kind, value);
        self
    }

    pub fn with_week(mut self, kind: MetricKind, value: f64) -> Self {
        self.week.insert(kind, value);
        self
    }

    pub fn failing_range(mut self, kind: MetricKind) -> Self {
        self.fail_range.insert(kind);
        self
    }

    pub fn failing_current_scalar(mut self) -> Self {
        self.fail_current_scalar = true;
        self
    }

    pub fn failing_day_scalar(mut self) -> Self {
        self.fail_day_scalar = true;
        self
    }

    pub fn failing_week_scalar(mut self) -> Self {
        self.fail_week_scalar = true;
        self
    }
}

#[async_trait::async_trait]
impl RangeQueryBackend for MockRangeQueryBackend {
    async fn query_range(
        &self,
        kind: MetricKind,
        _range: &TimeRange,
        _step_micros: i64,
        _granularity: Granularity,
        _filter: &QueryFilter,
    ) -> Result<Vec<RangeSeries>> {
        if self.fail_range.contains(&kind) {
            return Err(ChartError::backend(SourceKind::RangeQuery, "range query refused"));
        }
        Ok(self.series.get(&kind).cloned().unwrap_or_default())
    }

    async fn query_scalar(
        &self,
        kind: MetricKind,
        window: &TimeRange,
        _filter: &QueryFilter,
    ) -> Result<Option<f64>> {
        let (failing, values) = if window.start_micros() == self.base_start {
            (self.fail_current_scalar, &self.current)
        } else if window.start_micros() == self.base_start - DAY_MICROS {
            (self.fail_day_scalar, &self.day)
        } else if window.start_micros() == self.base_start - WEEK_MICROS {
            (self.fail_week_scalar, &self.week)
        } else {
            panic!("unexpected scalar window starting at {}", window.start_micros());
        };
        if failing {
            return Err(ChartError::backend(SourceKind::RangeQuery, "scalar query refused"));
        }
        Ok(values.get(&kind).copied())
    }
}

/// Engine over the two mock backends with default configuration.
pub fn engine(columnar: MockColumnarBackend, range: MockRangeQueryBackend) -> RedChartEngine {
    RedChartEngine::new(Config::default(), Arc::new(columnar), Arc::new(range)).unwrap()
}
