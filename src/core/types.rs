use crate::core::error::{ChartError, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Microseconds in one minute, the display unit for throughput.
pub const MICROS_PER_MINUTE: i64 = 60_000_000;

/// Canonical (service, endpoint) identity a chart request is scoped to.
///
/// Range-query results carry their identity as labels; the key is rebuilt
/// from those labels and compared structurally against the request target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointKey {
    service: String,
    endpoint: String,
}

impl EndpointKey {
    /// Creates a new key after validation.
    pub fn new(service: String, endpoint: String) -> Result<Self> {
        if service.is_empty() {
            return Err(ChartError::config("service name cannot be empty"));
        }
        if endpoint.is_empty() {
            return Err(ChartError::config("endpoint cannot be empty"));
        }
        Ok(EndpointKey { service, endpoint })
    }

    /// Rebuilds a key from a backend label set, using the configured label
    /// keys. Returns `None` when either label is missing.
    pub fn from_labels(
        labels: &FxHashMap<String, String>,
        service_key: &str,
        endpoint_key: &str,
    ) -> Option<Self> {
        let service = labels.get(service_key)?;
        let endpoint = labels.get(endpoint_key)?;
        Some(EndpointKey {
            service: service.clone(),
            endpoint: endpoint.clone(),
        })
    }

    /// Service name component.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Endpoint content component.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.service, self.endpoint)
    }
}

/// Request window in microsecond epoch time. Both endpoints' buckets
/// belong to the charted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    start_micros: i64,
    end_micros: i64,
}

impl TimeRange {
    /// Creates a validated range. Fails fast when `end <= start`, before any
    /// backend call is issued.
    pub fn new(start_micros: i64, end_micros: i64) -> Result<Self> {
        if end_micros <= start_micros {
            return Err(ChartError::InvalidRange {
                start: start_micros,
                end: end_micros,
            });
        }
        Ok(TimeRange {
            start_micros,
            end_micros,
        })
    }

    /// Window start in microseconds.
    pub fn start_micros(&self) -> i64 {
        self.start_micros
    }

    /// Window end in microseconds.
    pub fn end_micros(&self) -> i64 {
        self.end_micros
    }

    /// Total window length in microseconds.
    pub fn duration_micros(&self) -> i64 {
        self.end_micros - self.start_micros
    }

    /// The same-length window shifted `offset_micros` into the past.
    pub fn shifted_back(&self, offset_micros: i64) -> TimeRange {
        TimeRange {
            start_micros: self.start_micros - offset_micros,
            end_micros: self.end_micros - offset_micros,
        }
    }
}

/// The three RED chart kinds produced per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Average request latency.
    Latency,
    /// Percentage of failed requests.
    ErrorRate,
    /// Requests per minute.
    Throughput,
}

impl MetricKind {
    /// All kinds, in emission order.
    pub const ALL: [MetricKind; 3] = [
        MetricKind::Latency,
        MetricKind::ErrorRate,
        MetricKind::Throughput,
    ];

    /// Fixed chart title for this kind.
    pub fn title(&self) -> &'static str {
        match self {
            MetricKind::Latency => "Average Response Time",
            MetricKind::ErrorRate => "Error Rate",
            MetricKind::Throughput => "Throughput",
        }
    }

    /// Fixed display unit for this kind.
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::Latency => "ms",
            MetricKind::ErrorRate => "%",
            MetricKind::Throughput => "req/min",
        }
    }

    /// Short name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Latency => "latency",
            MetricKind::ErrorRate => "error-rate",
            MetricKind::Throughput => "throughput",
        }
    }
}

/// Which source strategy serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourcePreference {
    /// Pre-aggregated columnar store.
    Columnar,
    /// Range-query time-series store.
    RangeQuery,
}

impl FromStr for SourcePreference {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "columnar" => Ok(SourcePreference::Columnar),
            "range-query" => Ok(SourcePreference::RangeQuery),
            other => Err(ChartError::config(format!(
                "unknown source preference '{}', expected 'columnar' or 'range-query'",
                other
            ))),
        }
    }
}

/// One pre-aggregated columnar row. Rows are sparse: a bucket with no
/// observations is simply absent from the result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketAggregate {
    /// Bucket index, `floor(timestamp / step)`.
    pub bucket_index: i64,
    /// Requests observed in the bucket.
    pub total_count: u64,
    /// Failed requests observed in the bucket. Never exceeds `total_count`.
    pub total_error_count: u64,
    /// Summed request duration in microseconds.
    pub total_duration_micros: u64,
}

/// Whole-window aggregate, either returned by the columnar backend for a
/// historical window or accumulated locally from bucket rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowAggregate {
    /// Requests observed in the window.
    pub total_count: u64,
    /// Failed requests observed in the window.
    pub total_error_count: u64,
    /// Summed request duration in microseconds.
    pub total_duration_micros: u64,
    /// Window length in microseconds.
    pub window_duration_micros: i64,
}

impl WindowAggregate {
    /// An empty aggregate over a window of the given length.
    pub fn empty(window_duration_micros: i64) -> Self {
        WindowAggregate {
            total_count: 0,
            total_error_count: 0,
            total_duration_micros: 0,
            window_duration_micros,
        }
    }

    /// Folds one bucket row into the aggregate.
    pub fn add_bucket(&mut self, bucket: &BucketAggregate) {
        self.total_count += bucket.total_count;
        self.total_error_count += bucket.total_error_count;
        self.total_duration_micros += bucket.total_duration_micros;
    }

    /// Average latency in microseconds; 0 when the window saw no requests.
    pub fn avg_latency_micros(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        self.total_duration_micros as f64 / self.total_count as f64
    }

    /// Error percentage; 0 when the window saw no requests.
    pub fn error_rate_percent(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        100.0 * self.total_error_count as f64 / self.total_count as f64
    }

    /// Requests per minute over the window.
    pub fn throughput_per_minute(&self) -> f64 {
        if self.window_duration_micros <= 0 {
            return 0.0;
        }
        self.total_count as f64 * MICROS_PER_MINUTE as f64 / self.window_duration_micros as f64
    }
}

/// One (timestamp, value) sample from a range query. Timestamps are
/// backend-native and not necessarily bucket-aligned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    /// Sample timestamp in microsecond epoch time.
    pub timestamp_micros: i64,
    /// Sample value in backend-native units.
    pub value: f64,
}

/// A labeled series returned by one range query.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSeries {
    /// Label set identifying the series.
    pub labels: FxHashMap<String, String>,
    /// Ordered samples.
    pub samples: Vec<SamplePoint>,
}

/// Chart data keyed by bucket-start timestamp. One entry per bucket in the
/// requested window, always populated — never sparse to the caller.
pub type ChartPoints = BTreeMap<i64, f64>;

/// Current window value plus the two comparison references, one per metric
/// kind. References stay `None` when the reference window is missing, zero,
/// or failed — never coerced to a 0% change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonTriple {
    /// Value over the requested window.
    pub current: f64,
    /// Percentage delta against the 24h-ago reference.
    pub day_over_day: Option<f64>,
    /// Percentage delta against the 7d-ago reference.
    pub week_over_week: Option<f64>,
}

/// Wire-shape comparison ratios attached to a timeseries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ratio {
    /// Percentage delta against the 24h-ago reference.
    pub day_over_day: Option<f64>,
    /// Percentage delta against the 7d-ago reference.
    pub week_over_week: Option<f64>,
}

/// One legend line of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeseries {
    /// Display legend, the service name.
    pub legend: String,
    /// Identity labels for the series.
    pub labels: BTreeMap<String, String>,
    /// Fully-populated chart data.
    pub chart_data: ChartPoints,
    /// Comparison ratios.
    pub ratio: Ratio,
    /// Value over the requested window.
    pub value: f64,
}

/// One assembled chart: fixed title/unit plus its timeseries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartResult {
    /// Fixed chart title for the metric kind.
    pub title: String,
    /// Fixed display unit for the metric kind.
    pub unit: String,
    /// Legend lines; exactly one per request identity.
    pub timeseries: Vec<Timeseries>,
}

/// Response envelope. A failed primary query yields an empty chart list and
/// a diagnostic message instead of a propagated error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedChartResponse {
    /// Assembled charts, one per metric kind.
    pub results: Vec<ChartResult>,
    /// Diagnostic message, present only on soft failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl RedChartResponse {
    /// Successful response carrying the assembled charts.
    pub fn with_results(results: Vec<ChartResult>) -> Self {
        RedChartResponse { results, msg: None }
    }

    /// Soft-fail response: empty chart list plus diagnostic message.
    pub fn soft_fail<S: Into<String>>(msg: S) -> Self {
        RedChartResponse {
            results: Vec::new(),
            msg: Some(msg.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_key_validation() {
        assert!(EndpointKey::new("checkout".into(), "/api/pay".into()).is_ok());
        assert!(EndpointKey::new("".into(), "/api/pay".into()).is_err());
        assert!(EndpointKey::new("checkout".into(), "".into()).is_err());
    }

    #[test]
    fn test_endpoint_key_from_labels() {
        let mut labels = FxHashMap::default();
        labels.insert("svc_name".to_string(), "checkout".to_string());
        labels.insert("content_key".to_string(), "/api/pay".to_string());

        let key = EndpointKey::from_labels(&labels, "svc_name", "content_key").unwrap();
        assert_eq!(key.service(), "checkout");
        assert_eq!(key.endpoint(), "/api/pay");

        labels.remove("content_key");
        assert!(EndpointKey::from_labels(&labels, "svc_name", "content_key").is_none());
    }

    #[test]
    fn test_time_range_validation() {
        assert!(TimeRange::new(0, 1).is_ok());
        assert!(matches!(
            TimeRange::new(5, 5),
            Err(ChartError::InvalidRange { start: 5, end: 5 })
        ));
        assert!(TimeRange::new(10, 3).is_err());
    }

    #[test]
    fn test_time_range_shift() {
        let range = TimeRange::new(1_000, 2_000).unwrap();
        let shifted = range.shifted_back(500);
        assert_eq!(shifted.start_micros(), 500);
        assert_eq!(shifted.end_micros(), 1_500);
        assert_eq!(shifted.duration_micros(), range.duration_micros());
    }

    #[test]
    fn test_window_aggregate_accessors() {
        let mut agg = WindowAggregate::empty(120_000_000);
        assert_eq!(agg.avg_latency_micros(), 0.0);
        assert_eq!(agg.error_rate_percent(), 0.0);
        assert_eq!(agg.throughput_per_minute(), 0.0);

        agg.add_bucket(&BucketAggregate {
            bucket_index: 0,
            total_count: 600,
            total_error_count: 6,
            total_duration_micros: 600_000,
        });
        assert_eq!(agg.avg_latency_micros(), 1000.0);
        assert_eq!(agg.error_rate_percent(), 1.0);
        assert_eq!(agg.throughput_per_minute(), 300.0);
    }

    #[test]
    fn test_response_envelope() {
        let ok = RedChartResponse::with_results(Vec::new());
        assert!(ok.msg.is_none());

        let failed = RedChartResponse::soft_fail("query redmetrics: connection refused");
        assert!(failed.results.is_empty());
        assert_eq!(failed.msg.as_deref(), Some("query redmetrics: connection refused"));
    }

    #[test]
    fn test_timeseries_serializes_camel_case() {
        let series = Timeseries {
            legend: "checkout".to_string(),
            labels: BTreeMap::new(),
            chart_data: ChartPoints::new(),
            ratio: Ratio {
                day_over_day: Some(12.5),
                week_over_week: None,
            },
            value: 42.0,
        };
        let json = serde_json::to_value(&series).unwrap();
        assert!(json.get("chartData").is_some());
        assert_eq!(json["ratio"]["dayOverDay"], 12.5);
        assert!(json["ratio"]["weekOverWeek"].is_null());
    }
}
