//! Adapter over the pre-aggregated columnar source.
//!
//! One fetch issues the per-bucket rows (the primary query) and the two
//! historical comparison windows concurrently. The historical windows are
//! secondary: if one fails, only its ratio degrades to absent.

use crate::backend::ColumnarBackend;
use crate::core::config::ComparisonConfig;
use crate::core::{BucketAggregate, EndpointKey, Result, TimeRange, WindowAggregate};
use std::sync::Arc;
use tracing::warn;

/// Everything the columnar strategy needs for one request.
#[derive(Debug, Clone)]
pub struct ColumnarFetch {
    /// Sparse per-bucket rows over the requested window.
    pub buckets: Vec<BucketAggregate>,
    /// Aggregate over `[start - day_offset, start)`, absent on failure.
    pub day_reference: Option<WindowAggregate>,
    /// Aggregate over `[start - week_offset, start)`, absent on failure.
    pub week_reference: Option<WindowAggregate>,
}

/// Fetches chart inputs from a [`ColumnarBackend`].
pub struct ColumnarAdapter {
    backend: Arc<dyn ColumnarBackend>,
}

impl ColumnarAdapter {
    /// Wraps a columnar backend.
    pub fn new(backend: Arc<dyn ColumnarBackend>) -> Self {
        ColumnarAdapter { backend }
    }

    /// Issues the bucket query and both reference-window queries
    /// concurrently. A bucket-query failure propagates; reference-window
    /// failures degrade to `None`.
    pub async fn fetch(
        &self,
        key: &EndpointKey,
        range: &TimeRange,
        step_micros: i64,
        comparison: &ComparisonConfig,
    ) -> Result<ColumnarFetch> {
        let day_window = TimeRange::new(
            range.start_micros() - comparison.day_offset_micros(),
            range.start_micros(),
        )?;
        let week_window = TimeRange::new(
            range.start_micros() - comparison.week_offset_micros(),
            range.start_micros(),
        )?;

        let (buckets, day, week) = tokio::join!(
            self.backend.query_bucket_aggregates(range, key, step_micros),
            self.backend.query_window_aggregate(&day_window, key),
            self.backend.query_window_aggregate(&week_window, key),
        );

        let buckets = buckets?;
        let day_reference = match day {
            Ok(agg) => Some(agg),
            Err(e) => {
                warn!(endpoint = %key, error = %e, "day-over-day window query failed");
                None
            },
        };
        let week_reference = match week {
            Ok(agg) => Some(agg),
            Err(e) => {
                warn!(endpoint = %key, error = %e, "week-over-week window query failed");
                None
            },
        };

        Ok(ColumnarFetch {
            buckets,
            day_reference,
            week_reference,
        })
    }
}
