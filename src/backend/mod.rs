//! Telemetry backend traits and query vocabulary.
//!
//! The engine consumes two interchangeable sources through the traits in
//! this module: a pre-aggregated columnar store and a range-query
//! time-series store. Query execution, connection pooling, and the
//! backends' query languages live behind these traits; this crate only
//! defines the result contract it consumes.

use crate::core::config::LabelConfig;
use crate::core::{
    BucketAggregate, ChartError, EndpointKey, MetricKind, Result, TimeRange, WindowAggregate,
};
use crate::core::types::RangeSeries;
use rustc_hash::FxHashMap;

pub mod columnar;
pub mod fake;
pub mod range_query;

pub use columnar::{ColumnarAdapter, ColumnarFetch};
pub use range_query::{RangeFetch, RangeQueryAdapter, ScalarTriple};

/// Backend-side aggregation resolution for range queries: which label set
/// the backend groups series by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One series per service.
    Service,
    /// One series per (service, endpoint) pair.
    Endpoint,
}

impl Granularity {
    /// Short name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Service => "service",
            Granularity::Endpoint => "endpoint",
        }
    }

    /// The configured label keys the backend should group by.
    pub fn group_keys<'a>(&self, labels: &'a LabelConfig) -> Vec<&'a str> {
        match self {
            Granularity::Service => vec![labels.service_key.as_str()],
            Granularity::Endpoint => {
                vec![labels.service_key.as_str(), labels.endpoint_key.as_str()]
            },
        }
    }
}

/// One equality match in a query filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMatch {
    /// Label key, validated against the allowlist.
    pub key: String,
    /// Required label value.
    pub value: String,
}

/// Label filter attached to range and scalar queries.
///
/// Filters are built through [`QueryFilter::builder`], which rejects keys
/// outside the configured allowlist, so a backend never sees a filter on a
/// label the deployment has not declared queryable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    matches: Vec<LabelMatch>,
}

impl QueryFilter {
    /// Starts a filter builder bound to the label configuration.
    pub fn builder(labels: &LabelConfig) -> QueryFilterBuilder<'_> {
        QueryFilterBuilder {
            labels,
            matches: Vec::new(),
        }
    }

    /// The equality matches in declaration order.
    pub fn matches(&self) -> &[LabelMatch] {
        &self.matches
    }

    /// Returns true if a label set satisfies every match. Used by in-process
    /// backends; real backends translate the filter into their own query
    /// language instead.
    pub fn accepts(&self, labels: &FxHashMap<String, String>) -> bool {
        self.matches
            .iter()
            .all(|m| labels.get(&m.key).is_some_and(|v| *v == m.value))
    }
}

/// Chainable builder for [`QueryFilter`].
#[derive(Debug)]
pub struct QueryFilterBuilder<'a> {
    labels: &'a LabelConfig,
    matches: Vec<LabelMatch>,
}

impl<'a> QueryFilterBuilder<'a> {
    /// Adds an equality match. Fails when the key is not allowlisted.
    pub fn equal(mut self, key: &str, value: &str) -> Result<Self> {
        if !self.labels.is_allowed(key) {
            return Err(ChartError::LabelNotAllowed(key.to_string()));
        }
        self.matches.push(LabelMatch {
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(self)
    }

    /// Finishes the filter.
    pub fn build(self) -> QueryFilter {
        QueryFilter {
            matches: self.matches,
        }
    }
}

/// Pre-aggregated columnar telemetry store.
#[async_trait::async_trait]
pub trait ColumnarBackend: Send + Sync {
    /// Fetch per-bucket aggregates over the window. The result is sparse:
    /// buckets with no observations are absent.
    async fn query_bucket_aggregates(
        &self,
        range: &TimeRange,
        key: &EndpointKey,
        step_micros: i64,
    ) -> Result<Vec<BucketAggregate>>;

    /// Fetch a single aggregate summed over the whole window.
    async fn query_window_aggregate(
        &self,
        range: &TimeRange,
        key: &EndpointKey,
    ) -> Result<WindowAggregate>;
}

/// Range-query time-series telemetry store.
#[async_trait::async_trait]
pub trait RangeQueryBackend: Send + Sync {
    /// Evaluate the metric expression for `kind` over the window, returning
    /// zero or more labeled series in backend-native units.
    async fn query_range(
        &self,
        kind: MetricKind,
        range: &TimeRange,
        step_micros: i64,
        granularity: Granularity,
        filter: &QueryFilter,
    ) -> Result<Vec<RangeSeries>>;

    /// Evaluate the metric expression for `kind` aggregated over the whole
    /// window. `Ok(None)` means the query succeeded but matched no data.
    async fn query_scalar(
        &self,
        kind: MetricKind,
        window: &TimeRange,
        filter: &QueryFilter,
    ) -> Result<Option<f64>>;
}
