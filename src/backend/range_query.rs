//! Adapter over the range-query time-series source.
//!
//! One fetch fans out three range queries (latency, error-rate, throughput)
//! plus a scalar triple (current, 24h-ago, 7d-ago) per metric kind. The
//! latency range series is the primary query; everything else degrades on
//! failure. Values are normalized into display units at this boundary, and
//! every returned series is re-keyed from its labels and discarded unless
//! it matches the pending request identity.

use crate::backend::{Granularity, QueryFilter, RangeQueryBackend};
use crate::core::config::{ComparisonConfig, LabelConfig};
use crate::core::types::RangeSeries;
use crate::core::{EndpointKey, MetricKind, Result, SamplePoint, TimeRange};
use std::sync::Arc;
use tracing::{debug, warn};

/// Whole-window scalar aggregates for one metric kind. `None` marks a
/// failed or empty query, never a zero value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScalarTriple {
    /// Aggregate over the requested window.
    pub current: Option<f64>,
    /// Aggregate over the window shifted back by the day offset.
    pub day_reference: Option<f64>,
    /// Aggregate over the window shifted back by the week offset.
    pub week_reference: Option<f64>,
}

/// Range samples plus scalar aggregates for one metric kind, in display
/// units. An empty sample list means the chart stays zero-filled.
#[derive(Debug, Clone, Default)]
pub struct MetricFetch {
    /// Matched series samples, normalized.
    pub samples: Vec<SamplePoint>,
    /// Scalar aggregates, normalized.
    pub scalars: ScalarTriple,
}

/// Everything the range-query strategy needs for one request.
#[derive(Debug, Clone, Default)]
pub struct RangeFetch {
    /// Average latency, in milliseconds.
    pub latency: MetricFetch,
    /// Error rate, in percent.
    pub error_rate: MetricFetch,
    /// Throughput, in requests per minute.
    pub throughput: MetricFetch,
}

impl RangeFetch {
    /// Borrow the fetch for one metric kind.
    pub fn for_kind(&self, kind: MetricKind) -> &MetricFetch {
        match kind {
            MetricKind::Latency => &self.latency,
            MetricKind::ErrorRate => &self.error_rate,
            MetricKind::Throughput => &self.throughput,
        }
    }
}

/// Converts a backend-native value into the display unit for its kind:
/// latency µs→ms, error-rate fraction→percent, throughput per-second→per-minute.
fn normalize(kind: MetricKind, value: f64) -> f64 {
    match kind {
        MetricKind::Latency => value / 1_000.0,
        MetricKind::ErrorRate => value * 100.0,
        MetricKind::Throughput => value * 60.0,
    }
}

/// Fetches chart inputs from a [`RangeQueryBackend`].
pub struct RangeQueryAdapter {
    backend: Arc<dyn RangeQueryBackend>,
    labels: LabelConfig,
}

impl RangeQueryAdapter {
    /// Wraps a range-query backend with the label configuration used for
    /// filter building and identity rematching.
    pub fn new(backend: Arc<dyn RangeQueryBackend>, labels: LabelConfig) -> Self {
        RangeQueryAdapter { backend, labels }
    }

    /// Issues all sub-queries for one request concurrently. A latency
    /// range-query failure propagates; every other failure degrades that
    /// piece of the fetch.
    pub async fn fetch(
        &self,
        key: &EndpointKey,
        range: &TimeRange,
        step_micros: i64,
        comparison: &ComparisonConfig,
    ) -> Result<RangeFetch> {
        let filter = QueryFilter::builder(&self.labels)
            .equal(&self.labels.service_key, key.service())?
            .equal(&self.labels.endpoint_key, key.endpoint())?
            .build();
        let granularity = Granularity::Endpoint;

        let (latency_res, error_res, throughput_res) = tokio::join!(
            self.backend
                .query_range(MetricKind::Latency, range, step_micros, granularity, &filter),
            self.backend
                .query_range(MetricKind::ErrorRate, range, step_micros, granularity, &filter),
            self.backend
                .query_range(MetricKind::Throughput, range, step_micros, granularity, &filter),
        );

        // Primary: the latency series decides the fate of the request.
        let latency_samples = self.select_series(key, MetricKind::Latency, latency_res?);
        let error_samples = self.degraded_series(key, MetricKind::ErrorRate, error_res);
        let throughput_samples = self.degraded_series(key, MetricKind::Throughput, throughput_res);

        let day_window = range.shifted_back(comparison.day_offset_micros());
        let week_window = range.shifted_back(comparison.week_offset_micros());
        let filter_ref = &filter;
        let scalars = futures::future::join_all(MetricKind::ALL.map(|kind| async move {
            let (current, day, week) = tokio::join!(
                self.scalar_or_none(kind, "current", range, filter_ref),
                self.scalar_or_none(kind, "24h-ago", &day_window, filter_ref),
                self.scalar_or_none(kind, "7d-ago", &week_window, filter_ref),
            );
            ScalarTriple {
                current,
                day_reference: day,
                week_reference: week,
            }
        }))
        .await;

        Ok(RangeFetch {
            latency: MetricFetch {
                samples: latency_samples,
                scalars: scalars[0],
            },
            error_rate: MetricFetch {
                samples: error_samples,
                scalars: scalars[1],
            },
            throughput: MetricFetch {
                samples: throughput_samples,
                scalars: scalars[2],
            },
        })
    }

    /// Picks the series matching the request identity and normalizes its
    /// samples. Series whose label-derived key differs are discarded.
    fn select_series(
        &self,
        key: &EndpointKey,
        kind: MetricKind,
        series: Vec<RangeSeries>,
    ) -> Vec<SamplePoint> {
        let mut matched: Option<Vec<SamplePoint>> = None;
        for s in series {
            let series_key = EndpointKey::from_labels(
                &s.labels,
                &self.labels.service_key,
                &self.labels.endpoint_key,
            );
            if series_key.as_ref() != Some(key) {
                debug!(
                    metric = kind.as_str(),
                    endpoint = %key,
                    "discarding range series with foreign identity"
                );
                continue;
            }
            if matched.is_some() {
                debug!(metric = kind.as_str(), endpoint = %key, "duplicate series match, keeping first");
                continue;
            }
            matched = Some(
                s.samples
                    .iter()
                    .map(|p| SamplePoint {
                        timestamp_micros: p.timestamp_micros,
                        value: normalize(kind, p.value),
                    })
                    .collect(),
            );
        }
        matched.unwrap_or_default()
    }

    /// Like [`Self::select_series`], but a failed query degrades to an
    /// empty sample list instead of failing the request.
    fn degraded_series(
        &self,
        key: &EndpointKey,
        kind: MetricKind,
        result: Result<Vec<RangeSeries>>,
    ) -> Vec<SamplePoint> {
        match result {
            Ok(series) => self.select_series(key, kind, series),
            Err(e) => {
                warn!(metric = kind.as_str(), endpoint = %key, error = %e, "range query failed, chart degrades to zero-fill");
                Vec::new()
            },
        }
    }

    /// Runs one scalar query, normalizing the value and flattening failures
    /// and empty results into `None`.
    async fn scalar_or_none(
        &self,
        kind: MetricKind,
        slot: &'static str,
        window: &TimeRange,
        filter: &QueryFilter,
    ) -> Option<f64> {
        match self.backend.query_scalar(kind, window, filter).await {
            Ok(value) => value.map(|v| normalize(kind, v)),
            Err(e) => {
                warn!(metric = kind.as_str(), slot, error = %e, "scalar query failed, ratio degrades to absent");
                None
            },
        }
    }
}
