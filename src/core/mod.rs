//! Core domain models and business logic for the chart engine.
//!
//! This module contains the fundamental types shared by the bucketizer,
//! the source adapters, and the chart assembler.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder, LabelConfig, StepConfig};
pub use error::{ChartError, Result, SourceKind};
pub use types::{
    BucketAggregate, ChartPoints, ChartResult, ComparisonTriple, EndpointKey, MetricKind, Ratio,
    RedChartResponse, SamplePoint, SourcePreference, TimeRange, Timeseries, WindowAggregate,
};
