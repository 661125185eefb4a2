use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid record '{name}': {reason}")]
    InvalidRecord { name: String, reason: String },

    #[error("Stage '{stage}' failed: {message}")]
    StageFailure { stage: String, message: String },

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
