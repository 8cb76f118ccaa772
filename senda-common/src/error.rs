// ================================================================
// File: senda-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Moderation input that is rejected before any analysis runs
    // (empty content, oversized file, wrong magic bytes).
    #[error("Invalid input: {0}")]
    InputInvalid(String),

    #[error("Capability '{capability}' timed out after {timeout_secs}s")]
    CapabilityTimeout { capability: String, timeout_secs: u64 },

    #[error("Capability '{0}' is not configured")]
    CapabilityUnavailable(String),

    #[error("Capability '{capability}' failed: {message}")]
    CapabilityError { capability: String, message: String },

    // Raised by the PDF basic fallback when there is no usable signal;
    // always downgraded to a reduced-confidence approval.
    #[error("Analysis inconclusive: {0}")]
    AnalysisInconclusive(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Internal(e.to_string())
    }
}
