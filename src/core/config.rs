//! Configuration management for the chart engine.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - CLI argument overrides
//! - Validation and defaults
//!
//! The step tiering policy, the comparison offsets, and the queryable
//! label-key allowlist are all explicit configuration values rather than
//! process-wide constants.

use crate::core::{ChartError, Result, SourcePreference};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete configuration for the chart engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source strategy selection.
    pub source: SourceConfig,
    /// Bucket width tiering policy.
    pub step: StepConfig,
    /// Day-over-day / week-over-week comparison offsets.
    pub comparison: ComparisonConfig,
    /// Backend label keys and the queryable-key allowlist.
    pub labels: LabelConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Debug mode.
    #[serde(skip)]
    pub debug: bool,
}

/// Source strategy selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Strategy used when a request carries no explicit preference.
    pub preference: SourcePreference,
}

/// One tier of the bucket width policy: ranges up to `up_to` long use
/// buckets of width `step`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepTier {
    /// Upper bound (inclusive) on the request range length.
    #[serde(with = "humantime_serde")]
    pub up_to: Duration,
    /// Bucket width for ranges in this tier.
    #[serde(with = "humantime_serde")]
    pub step: Duration,
}

/// Bucket width tiering policy, keyed by total range length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Tiers in ascending `up_to` order.
    pub tiers: Vec<StepTier>,
    /// Bucket width for ranges longer than the last tier.
    #[serde(with = "humantime_serde")]
    pub max_step: Duration,
}

impl StepConfig {
    /// Selects the bucket width in microseconds for a range of the given
    /// length. Deterministic for identical inputs.
    pub fn step_micros_for(&self, range_duration_micros: i64) -> i64 {
        for tier in &self.tiers {
            if range_duration_micros <= tier.up_to.as_micros() as i64 {
                return tier.step.as_micros() as i64;
            }
        }
        self.max_step.as_micros() as i64
    }
}

/// Comparison window offsets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Day-over-day offset.
    #[serde(with = "humantime_serde")]
    pub day_offset: Duration,
    /// Week-over-week offset.
    #[serde(with = "humantime_serde")]
    pub week_offset: Duration,
}

impl ComparisonConfig {
    /// Day offset in microseconds.
    pub fn day_offset_micros(&self) -> i64 {
        self.day_offset.as_micros() as i64
    }

    /// Week offset in microseconds.
    pub fn week_offset_micros(&self) -> i64 {
        self.week_offset.as_micros() as i64
    }
}

/// Backend label keys and the allowlist of keys queries may filter on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Label key carrying the service name in range-query results.
    pub service_key: String,
    /// Label key carrying the endpoint content in range-query results.
    pub endpoint_key: String,
    /// Label keys permitted in query filters.
    pub allowlist: Vec<String>,
}

impl LabelConfig {
    /// Returns true if the key may appear in a query filter.
    pub fn is_allowed(&self, key: &str) -> bool {
        self.allowlist.iter().any(|k| k == key)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    pub level: LogLevel,
    /// Structured (compact, targeted) log output.
    pub structured: bool,
}

/// Log levels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source: SourceConfig::default(),
            step: StepConfig::default(),
            comparison: ComparisonConfig::default(),
            labels: LabelConfig::default(),
            logging: LoggingConfig::default(),
            debug: false,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            preference: SourcePreference::Columnar,
        }
    }
}

impl Default for StepConfig {
    fn default() -> Self {
        StepConfig {
            tiers: vec![
                StepTier {
                    up_to: Duration::from_secs(3600), // 1 hour
                    step: Duration::from_secs(60),
                },
                StepTier {
                    up_to: Duration::from_secs(6 * 3600),
                    step: Duration::from_secs(300),
                },
                StepTier {
                    up_to: Duration::from_secs(24 * 3600),
                    step: Duration::from_secs(900),
                },
                StepTier {
                    up_to: Duration::from_secs(7 * 24 * 3600),
                    step: Duration::from_secs(3600),
                },
            ],
            max_step: Duration::from_secs(6 * 3600),
        }
    }
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        ComparisonConfig {
            day_offset: Duration::from_secs(24 * 3600),
            week_offset: Duration::from_secs(7 * 24 * 3600),
        }
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        LabelConfig {
            service_key: "svc_name".to_string(),
            endpoint_key: "content_key".to_string(),
            allowlist: vec![
                "svc_name".to_string(),
                "content_key".to_string(),
                "cluster_id".to_string(),
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            structured: false,
        }
    }
}

impl Config {
    /// Create new config with defaults.
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        // Step policy validation
        if self.step.tiers.is_empty() {
            return Err(ChartError::config("step policy must define at least one tier"));
        }
        let mut prev_up_to = Duration::ZERO;
        for tier in &self.step.tiers {
            if tier.step.is_zero() {
                return Err(ChartError::config("step tier width must be greater than 0"));
            }
            if tier.up_to <= prev_up_to {
                return Err(ChartError::config(
                    "step tiers must be in strictly ascending up_to order",
                ));
            }
            prev_up_to = tier.up_to;
        }
        if self.step.max_step.is_zero() {
            return Err(ChartError::config("max_step must be greater than 0"));
        }

        // Comparison validation
        if self.comparison.day_offset.is_zero() || self.comparison.week_offset.is_zero() {
            return Err(ChartError::config("comparison offsets must be greater than 0"));
        }
        if self.comparison.week_offset <= self.comparison.day_offset {
            return Err(ChartError::config(
                "week_offset must be longer than day_offset",
            ));
        }

        // Label validation: the identity keys must themselves be queryable
        if self.labels.service_key.is_empty() || self.labels.endpoint_key.is_empty() {
            return Err(ChartError::config("label keys cannot be empty"));
        }
        for key in [&self.labels.service_key, &self.labels.endpoint_key] {
            if !self.labels.is_allowed(key) {
                return Err(ChartError::config(format!(
                    "identity label key '{}' is missing from the allowlist",
                    key
                )));
            }
        }

        Ok(())
    }
}

/// Configuration builder for programmatic construction.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string.
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| ChartError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set the default source preference.
    pub fn source_preference(mut self, preference: SourcePreference) -> Self {
        self.config.source.preference = preference;
        self
    }

    /// Set the identity label keys, adding them to the allowlist.
    pub fn identity_labels(mut self, service_key: &str, endpoint_key: &str) -> Self {
        self.config.labels.service_key = service_key.to_string();
        self.config.labels.endpoint_key = endpoint_key.to_string();
        for key in [service_key, endpoint_key] {
            if !self.config.labels.is_allowed(key) {
                self.config.labels.allowlist.push(key.to_string());
            }
        }
        self
    }

    /// Permit an additional label key in query filters.
    pub fn allow_label(mut self, key: &str) -> Self {
        if !self.config.labels.is_allowed(key) {
            self.config.labels.allowlist.push(key.to_string());
        }
        self
    }

    /// Set debug mode.
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
