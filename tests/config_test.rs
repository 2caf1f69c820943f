//! Configuration system tests.

use redchart_lib::cli::Cli;
use redchart_lib::core::{Config, ConfigBuilder, SourcePreference};
use std::io::Write;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.source.preference, SourcePreference::Columnar);
    assert_eq!(config.step.tiers.len(), 4);
    assert_eq!(config.labels.service_key, "svc_name");
    assert_eq!(config.labels.endpoint_key, "content_key");
    assert_eq!(config.comparison.day_offset_micros(), 24 * 3_600_000_000);
    assert_eq!(config.comparison.week_offset_micros(), 7 * 24 * 3_600_000_000);
}

#[test]
fn test_config_builder() {
    let config = ConfigBuilder::new()
        .source_preference(SourcePreference::RangeQuery)
        .allow_label("namespace")
        .debug(true)
        .build()
        .unwrap();

    assert_eq!(config.source.preference, SourcePreference::RangeQuery);
    assert!(config.labels.is_allowed("namespace"));
    assert!(config.debug);
}

#[test]
fn test_yaml_config() {
    let yaml = r#"
source:
  preference: range-query
step:
  tiers:
    - up_to: 1h
      step: 30s
    - up_to: 24h
      step: 10m
  max_step: 2h
comparison:
  day_offset: 24h
  week_offset: 7days
labels:
  service_key: service
  endpoint_key: operation
  allowlist: [service, operation, namespace]
logging:
  level: debug
  structured: true
"#;

    let config = ConfigBuilder::new()
        .from_yaml(yaml)
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(config.source.preference, SourcePreference::RangeQuery);
    assert_eq!(config.step.tiers.len(), 2);
    // 30 minutes falls in the first tier.
    assert_eq!(config.step.step_micros_for(30 * 60_000_000), 30_000_000);
    // A month-long range falls back to max_step.
    assert_eq!(
        config.step.step_micros_for(30 * 24 * 3_600_000_000),
        2 * 3_600_000_000
    );
    assert_eq!(config.labels.service_key, "service");
    assert!(config.labels.is_allowed("namespace"));
}

#[test]
fn test_yaml_with_unlisted_identity_key_fails_validation() {
    let yaml = r#"
labels:
  service_key: service
  endpoint_key: operation
  allowlist: [service]
"#;
    let result = ConfigBuilder::new().from_yaml(yaml).unwrap().build();
    assert!(result.is_err());
}

fn cli_with_config(path: Option<std::path::PathBuf>) -> Cli {
    Cli {
        service: "checkout".to_string(),
        endpoint: "/api/pay".to_string(),
        start: None,
        end: None,
        source: None,
        config: path,
        seed: 7,
        debug: false,
        check_config: false,
        version: false,
    }
}

#[tokio::test]
async fn test_cli_loads_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "source:\n  preference: range-query\n"
    )
    .unwrap();

    let cli = cli_with_config(Some(file.path().to_path_buf()));
    let config = cli.load_config().await.unwrap();
    assert_eq!(config.source.preference, SourcePreference::RangeQuery);
}

#[tokio::test]
async fn test_cli_source_flag_overrides_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "source:\n  preference: range-query\n"
    )
    .unwrap();

    let mut cli = cli_with_config(Some(file.path().to_path_buf()));
    cli.source = Some("columnar".to_string());
    let config = cli.load_config().await.unwrap();
    assert_eq!(config.source.preference, SourcePreference::Columnar);
}

#[tokio::test]
async fn test_cli_missing_explicit_config_fails() {
    let cli = cli_with_config(Some(std::path::PathBuf::from(
        "/nonexistent/redchart/config.yaml",
    )));
    assert!(cli.load_config().await.is_err());
}
