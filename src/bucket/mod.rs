//! Time bucketing for chart assembly.
//!
//! A request window is cut into fixed-width buckets; every chart point maps
//! to exactly one bucket. Bucket width comes from the configured tiering
//! policy ([`crate::core::config::StepConfig`]), keyed by total range
//! length. Boundaries are pure floor arithmetic, so identical inputs always
//! produce identical buckets.

use crate::core::{ChartPoints, TimeRange};

/// Inclusive bucket span covering a request window.
///
/// `start_bucket = floor(start / step)` and `end_bucket = floor(end / step)`;
/// both endpoints' buckets belong to the span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketRange {
    step_micros: i64,
    start_bucket: i64,
    end_bucket: i64,
}

impl BucketRange {
    /// Computes the bucket span for a window. `step_micros` must be
    /// positive, which config validation guarantees.
    pub fn new(range: &TimeRange, step_micros: i64) -> Self {
        BucketRange {
            step_micros,
            start_bucket: range.start_micros().div_euclid(step_micros),
            end_bucket: range.end_micros().div_euclid(step_micros),
        }
    }

    /// Bucket width in microseconds.
    pub fn step_micros(&self) -> i64 {
        self.step_micros
    }

    /// First bucket index in the span.
    pub fn start_bucket(&self) -> i64 {
        self.start_bucket
    }

    /// Last bucket index in the span.
    pub fn end_bucket(&self) -> i64 {
        self.end_bucket
    }

    /// Number of buckets in the span.
    pub fn bucket_count(&self) -> usize {
        (self.end_bucket - self.start_bucket + 1) as usize
    }

    /// Bucket index containing the given timestamp.
    pub fn bucket_index(&self, timestamp_micros: i64) -> i64 {
        timestamp_micros.div_euclid(self.step_micros)
    }

    /// Returns true if the bucket index falls inside the span.
    pub fn contains(&self, bucket_index: i64) -> bool {
        bucket_index >= self.start_bucket && bucket_index <= self.end_bucket
    }

    /// Start timestamp of a bucket.
    pub fn bucket_start_micros(&self, bucket_index: i64) -> i64 {
        bucket_index * self.step_micros
    }

    /// Iterates over the start timestamp of every bucket in the span.
    pub fn bucket_starts(&self) -> impl Iterator<Item = i64> + '_ {
        (self.start_bucket..=self.end_bucket).map(|i| i * self.step_micros)
    }

    /// Builds a chart map with every bucket present and set to 0.0. The
    /// assembler overlays real values on top; untouched buckets stay zero
    /// so gaps never surface as missing keys.
    pub fn zero_filled(&self) -> ChartPoints {
        self.bucket_starts().map(|ts| (ts, 0.0)).collect()
    }
}
