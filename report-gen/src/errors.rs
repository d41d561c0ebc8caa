//! Crate-wide error hierarchy for report-gen.
//!
//! Goals:
//! - Single root `Error` for all public functions.
//! - Cache transport failures stay distinguishable from a cache miss: a
//!   miss is `Ok(None)`, never an error.
//! - No dynamic dispatch, ergonomic `?` via `From` impls.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type ReportResult<T> = Result<T, Error>;

/// Root error type for the report-gen crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Scan report ingestion failure (unreadable file, invalid JSON).
    #[error(transparent)]
    Core(#[from] report_core::CoreError),

    /// Recommendation cache (D1 HTTP) failure.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// LLM provider/configuration failure surfaced outside the retry loop.
    #[error(transparent)]
    Llm(#[from] llm_service::LlmError),

    /// Writing the rendered report failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Recommendation cache errors. All of these are hard failures —
/// enrichment cannot proceed blind against an unreachable or
/// unauthorized store.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Required cache coordinate/credential is missing from the env.
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// D1 endpoint returned a non-success status.
    #[error("cache HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// Network/transport failure without a status.
    #[error("cache network error: {0}")]
    Network(String),

    /// The query envelope could not be decoded.
    #[error("cache decode error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Envelope decoded but had an unexpected shape.
    #[error("invalid cache response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for CacheError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            CacheError::HttpStatus {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            CacheError::Network(e.to_string())
        }
    }
}
