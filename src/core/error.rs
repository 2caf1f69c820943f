use thiserror::Error;

/// Which telemetry source a backend error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Pre-aggregated columnar store.
    Columnar,
    /// Range-query time-series store.
    RangeQuery,
}

impl SourceKind {
    /// Short name used in logs and diagnostic messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Columnar => "columnar",
            SourceKind::RangeQuery => "range-query",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("{source_kind} backend unavailable: {detail}")]
    BackendUnavailable {
        source_kind: SourceKind,
        detail: String,
    },

    #[error("invalid time range: end ({end}) must be after start ({start})")]
    InvalidRange { start: i64, end: i64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("label key not allowed by configuration: {0}")]
    LabelNotAllowed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for chart engine operations.
pub type Result<T> = std::result::Result<T, ChartError>;

impl ChartError {
    /// Creates a new backend-unavailable error.
    pub fn backend<S: Into<String>>(source_kind: SourceKind, detail: S) -> Self {
        Self::BackendUnavailable {
            source_kind,
            detail: detail.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true if the error should soft-fail the request (empty chart
    /// list plus diagnostic message) instead of propagating to the caller.
    pub fn is_soft_fail(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }

    /// Returns the error category for metrics/logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::BackendUnavailable { .. } => "backend",
            Self::InvalidRange { .. } => "validation",
            Self::Config(_) | Self::LabelNotAllowed(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}
