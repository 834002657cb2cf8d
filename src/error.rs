use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

// ---------------------------
// ## Error Handling
// ---------------------------

/// Errors raised at the chart-ingestion and configuration boundary.
///
/// Scoring functions themselves are total and never produce one of these.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown {kind} label: {label:?}")]
    UnknownLabel { kind: &'static str, label: String },

    #[error("invalid scoring configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse scoring configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to encode scoring configuration: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("inconsistent chart: {0}")]
    InconsistentChart(String),

    #[error("{domain} analyzer failed: {reason}")]
    AnalyzerFailed { domain: String, reason: String },
}

impl EngineError {
    pub(crate) fn unknown(kind: &'static str, label: &str) -> Self {
        EngineError::UnknownLabel {
            kind,
            label: label.to_string(),
        }
    }
}
