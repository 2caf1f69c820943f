//! Engine entry point: one call, three charts.
//!
//! The engine validates the request window, derives the bucket width from
//! the configured step policy, dispatches to the active source strategy,
//! and folds a failed primary query into the soft-fail response envelope.

use crate::backend::{ColumnarAdapter, ColumnarBackend, RangeQueryAdapter, RangeQueryBackend};
use crate::charts::{ChartRequest, ChartStrategy, ColumnarStrategy, RangeQueryStrategy};
use crate::core::{Config, EndpointKey, RedChartResponse, Result, SourcePreference, TimeRange};
use std::sync::Arc;
use tracing::{debug, warn};

/// Computes RED charts for a service endpoint from either telemetry source.
///
/// The engine holds no per-request state; one instance serves any number of
/// concurrent requests.
pub struct RedChartEngine {
    config: Config,
    columnar: ColumnarStrategy,
    range_query: RangeQueryStrategy,
}

impl RedChartEngine {
    /// Builds an engine over the two backends. Validates the configuration.
    pub fn new(
        config: Config,
        columnar: Arc<dyn ColumnarBackend>,
        range_query: Arc<dyn RangeQueryBackend>,
    ) -> Result<Self> {
        config.validate()?;
        let columnar_strategy = ColumnarStrategy::new(
            ColumnarAdapter::new(columnar),
            config.comparison.clone(),
        );
        let range_strategy = RangeQueryStrategy::new(
            RangeQueryAdapter::new(range_query, config.labels.clone()),
            config.comparison.clone(),
        );
        Ok(RedChartEngine {
            config,
            columnar: columnar_strategy,
            range_query: range_strategy,
        })
    }

    /// Computes the three RED charts over `[start_micros, end_micros]`.
    ///
    /// Fails fast on an invalid range, before any backend call. A failed
    /// primary query yields `Ok` with an empty chart list and a diagnostic
    /// message; only non-backend errors propagate as `Err`.
    pub async fn compute_red_charts(
        &self,
        key: &EndpointKey,
        start_micros: i64,
        end_micros: i64,
        preference: Option<SourcePreference>,
    ) -> Result<RedChartResponse> {
        let range = TimeRange::new(start_micros, end_micros)?;
        let step_micros = self.config.step.step_micros_for(range.duration_micros());
        let request = ChartRequest {
            key: key.clone(),
            range,
            step_micros,
        };

        let strategy: &dyn ChartStrategy =
            match preference.unwrap_or(self.config.source.preference) {
                SourcePreference::Columnar => &self.columnar,
                SourcePreference::RangeQuery => &self.range_query,
            };
        debug!(
            endpoint = %key,
            source = strategy.source_kind().as_str(),
            step_micros,
            "computing RED charts"
        );

        match strategy.assemble(&request).await {
            Ok(results) => Ok(RedChartResponse::with_results(results)),
            Err(e) if e.is_soft_fail() => {
                warn!(endpoint = %key, error = %e, "primary query failed, returning soft-fail response");
                Ok(RedChartResponse::soft_fail(format!(
                    "query red metrics failed: {}",
                    e
                )))
            },
            Err(e) => Err(e),
        }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}
