//! Redchart - time-bucketed RED metric chart engine.
//!
//! Redchart turns raw service telemetry from either of two interchangeable
//! backends into uniformly-shaped Rate/Error/Duration chart data for a
//! single service endpoint, including day-over-day and week-over-week
//! comparisons.
//!
//! # Features
//!
//! - **Dual sources**: a pre-aggregated columnar store and a range-query
//!   time-series store behind one strategy contract
//! - **Aligned buckets**: heterogeneous results reconciled into a
//!   zero-filled, gap-free bucket grid
//! - **Safe comparisons**: missing or zero reference windows yield absent
//!   ratios, never a fabricated 0% change
//! - **Soft failure**: a failed primary query degrades to an empty chart
//!   list with a diagnostic message
//!
//! # Architecture
//!
//! - `bucket`: bucket width policy and bucket enumeration
//! - `backend`: backend traits, query vocabulary, and source adapters
//! - `charts`: ratio calculator and the two assembly strategies
//! - `engine`: the `compute_red_charts` entry point
//! - `core`: domain models, errors, configuration
//! - `cli`: command-line demo harness
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use redchart_lib::backend::fake::{FakeColumnarBackend, FakeRangeQueryBackend};
//! use redchart_lib::core::{Config, EndpointKey};
//! use redchart_lib::engine::RedChartEngine;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = RedChartEngine::new(
//!         Config::default(),
//!         Arc::new(FakeColumnarBackend::new(7)),
//!         Arc::new(FakeRangeQueryBackend::new(7)),
//!     )?;
//!     let key = EndpointKey::new("checkout".into(), "/api/pay".into())?;
//!     let response = engine
//!         .compute_red_charts(&key, 0, 3_600_000_000, None)
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod backend;
pub mod bucket;
pub mod charts;
pub mod cli;
pub mod core;
pub mod engine;

// Re-export core types for convenience
pub use crate::core::{Config, Result};
pub use crate::engine::RedChartEngine;
