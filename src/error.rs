//! Errors surfaced to callers of the pipeline.
//!
//! Adapter failures (AI, templates, PDF rendering) never show up here: the
//! document cascade recovers from them locally.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("process {0} not found")]
    ProcessNotFound(i64),

    #[error("document {0} not found")]
    DocumentNotFound(i64),

    #[error("unsupported fund: {0}")]
    UnsupportedFund(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// True for errors caused by the request itself rather than the system.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::ProcessNotFound(_)
                | Self::DocumentNotFound(_)
                | Self::UnsupportedFund(_)
                | Self::InvalidInput(_)
        )
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
