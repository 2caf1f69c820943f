//! Command-line interface for the chart engine.
//!
//! The CLI is a demo harness: it runs one chart request against the
//! deterministic fake backends and prints the JSON response. The HTTP
//! binding that fronts the engine in production is a separate concern.

use crate::backend::fake::{FakeColumnarBackend, FakeRangeQueryBackend};
use crate::core::config::ConfigBuilder;
use crate::core::{ChartError, Config, EndpointKey, Result, SourcePreference};
use crate::engine::RedChartEngine;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

/// Compute RED charts for a service endpoint and print them as JSON.
#[derive(Parser, Debug)]
#[command(name = "redchart")]
#[command(version, about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Service name the charts are scoped to
    #[arg(long, env = "REDCHART_SERVICE", default_value = "checkout")]
    pub service: String,

    /// Endpoint content key the charts are scoped to
    #[arg(long, env = "REDCHART_ENDPOINT", default_value = "/api/pay")]
    pub endpoint: String,

    /// Window start, RFC3339 (default: one hour before end)
    #[arg(long)]
    pub start: Option<String>,

    /// Window end, RFC3339 (default: now)
    #[arg(long)]
    pub end: Option<String>,

    /// Source strategy: columnar or range-query (default: from config)
    #[arg(long, env = "REDCHART_SOURCE")]
    pub source: Option<String>,

    /// Configuration file path (default: ~/.config/redchart/config.yaml)
    #[arg(short, long, env = "REDCHART_CONFIG")]
    pub config: Option<PathBuf>,

    /// Seed for the fake telemetry backends
    #[arg(long, env = "REDCHART_SEED", default_value = "7")]
    pub seed: u64,

    /// Enable debug logging
    #[arg(short, long, env = "REDCHART_DEBUG")]
    pub debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,

    /// Show version information
    #[arg(short = 'V', long = "show-version")]
    pub version: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest priority)
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        let config_path = if let Some(path) = &self.config {
            path.clone()
        } else {
            let default_path = dirs::config_dir()
                .map(|d| d.join("redchart").join("config.yaml"))
                .unwrap_or_else(|| PathBuf::from("~/.config/redchart/config.yaml"));

            if default_path.exists() {
                default_path
            } else {
                return self.build_config_from_args(builder);
            }
        };

        match tokio::fs::read_to_string(&config_path).await {
            Ok(content) => {
                builder = builder.from_yaml(&content)?;
                tracing::info!("Loaded configuration from: {:?}", config_path);
            },
            Err(e) if self.config.is_some() => {
                // User explicitly specified a config file that doesn't exist
                return Err(ChartError::config(format!(
                    "Failed to read config file {:?}: {}",
                    config_path, e
                )));
            },
            Err(_) => {
                tracing::debug!("No config file found at {:?}, using defaults", config_path);
            },
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        if let Some(source) = &self.source {
            builder = builder.source_preference(source.parse()?);
        }
        builder = builder.debug(self.debug);
        builder.build()
    }

    /// Initialize logging based on flags and environment.
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let env_log_level =
            std::env::var("REDCHART_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_level = if self.debug {
            "debug"
        } else {
            env_log_level.as_str()
        };

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .compact();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| ChartError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }

    /// Resolve the request window from the RFC3339 arguments.
    fn resolve_window(&self) -> Result<(i64, i64)> {
        let end_micros = match &self.end {
            Some(raw) => parse_rfc3339_micros(raw)?,
            None => chrono::Utc::now().timestamp_micros(),
        };
        let start_micros = match &self.start {
            Some(raw) => parse_rfc3339_micros(raw)?,
            None => end_micros - 3_600_000_000,
        };
        Ok((start_micros, end_micros))
    }
}

fn parse_rfc3339_micros(raw: &str) -> Result<i64> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.timestamp_micros())
        .map_err(|e| ChartError::config(format!("invalid RFC3339 timestamp '{}': {}", raw, e)))
}

/// Execute one chart request.
pub async fn execute(cli: Cli) -> Result<()> {
    if cli.version {
        println!("redchart {}", env!("CARGO_PKG_VERSION"));
        println!("Time-bucketed RED metric chart engine");
        return Ok(());
    }

    cli.init_logging()?;

    let config = cli.load_config().await?;

    if cli.check_config {
        config.validate()?;
        println!("Configuration is valid!");
        println!("  Source preference: {:?}", config.source.preference);
        println!("  Step tiers: {}", config.step.tiers.len());
        println!("  Label allowlist: {:?}", config.labels.allowlist);
        return Ok(());
    }

    let (start_micros, end_micros) = cli.resolve_window()?;
    let key = EndpointKey::new(cli.service.clone(), cli.endpoint.clone())?;
    let preference: Option<SourcePreference> =
        cli.source.as_deref().map(str::parse).transpose()?;

    let engine = RedChartEngine::new(
        config,
        Arc::new(FakeColumnarBackend::new(cli.seed)),
        Arc::new(FakeRangeQueryBackend::new(cli.seed)),
    )?;

    tracing::info!(
        service = %cli.service,
        endpoint = %cli.endpoint,
        "computing RED charts over fake backends"
    );
    let response = engine
        .compute_red_charts(&key, start_micros, end_micros, preference)
        .await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
