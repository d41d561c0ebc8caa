//! Error types for report-core.
//!
//! Only *structural* failures live here (unreadable report file, invalid
//! JSON). Malformed fields inside an individual finding never error; the
//! ingest layer degrades them to defaults instead.

use thiserror::Error;

/// Convenient alias for core results.
pub type CoreResult<T> = Result<T, CoreError>;

/// Structural failures while reading or decoding a scan report.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Scan report file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Scan report is not valid JSON or lacks the `results` array.
    #[error("invalid scan report: {0}")]
    Decode(#[from] serde_json::Error),
}
