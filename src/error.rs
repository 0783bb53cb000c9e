//! Error types for the categorization and metrics engine

/// Result type for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Error types for analyzer operations
#[derive(thiserror::Error, Debug)]
pub enum AnalyzerError {
    #[error("Invalid duration '{input}': {reason}")]
    Format { input: String, reason: String },

    #[error("Cannot vectorize an empty corpus")]
    EmptyCorpus,

    #[error("Clustering error: {0}")]
    Clustering(String),

    #[error("Unsupported metric: {0}")]
    UnsupportedMetric(String),

    #[error("Cluster {code} has no unused label among candidates {candidates:?}")]
    AmbiguousLabel { code: usize, candidates: Vec<String> },

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalyzerError {
    pub(crate) fn format(input: &str, reason: impl Into<String>) -> Self {
        Self::Format {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
