//! Unified error handling for `llm-service`.
//!
//! A single top-level [`LlmError`] for the whole crate, with
//! domain-specific sub-enums for configuration and provider failures.
//! Provider errors keep enough shape for the caller's retry policy:
//! [`ProviderError::RateLimited`] is the only retryable class.
//!
//! All messages include the suffix `[LLM Service]` to simplify
//! attribution in logs.

use std::time::Duration;

use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the crate.
pub type Result<T> = std::result::Result<T, LlmError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LlmError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Provider request/response failures.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Underlying HTTP transport error without a status.
    #[error("[LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),
}

impl LlmError {
    /// Whether this failure is a throttling signal worth retrying with
    /// backoff. Everything else is assumed non-transient (bad credentials,
    /// malformed request, decode failure).
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::Provider(ProviderError::RateLimited { .. }))
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Errors raised while assembling provider configuration from env.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// Unsupported value in `MODEL_PROVIDER`.
    #[error("[LLM Service] unsupported model provider: {0:?} (use 'openai' or 'deepseek')")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid endpoint URL).
    #[error("[LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: &'static str,
    },
}

/* ------------------------------------------------------------------------- */
/* Provider errors                                                           */
/* ------------------------------------------------------------------------- */

/// Provider-level failure, mapped from HTTP status where one exists.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Unauthorized/forbidden (HTTP 401/403) — wrong or revoked key.
    #[error("[LLM Service] unauthorized")]
    Unauthorized,

    /// Rate limited (HTTP 429); retry with backoff.
    #[error("[LLM Service] rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Gateway/server error (HTTP 5xx).
    #[error("[LLM Service] server error: status {0}")]
    Server(u16),

    /// Any other non-success HTTP status.
    #[error("[LLM Service] HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        status: u16,
        url: String,
        snippet: String,
    },

    /// Timeout at transport level.
    #[error("[LLM Service] timeout after {0:?}")]
    Timeout(Duration),

    /// Network failure without a status (DNS/connect/reset).
    #[error("[LLM Service] network error: {0}")]
    Network(String),

    /// Response payload could not be decoded as expected.
    #[error("[LLM Service] decode error: {0}")]
    Decode(String),

    /// Completion arrived without any usable choice.
    #[error("[LLM Service] empty choices in completion response")]
    EmptyChoices,
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// Returns [`ConfigError::MissingVar`] if the variable is absent or empty.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/* ------------------------------------------------------------------------- */
/* Formatting helpers                                                        */
/* ------------------------------------------------------------------------- */

/// Short single-line excerpt of a response body for error messages.
pub fn make_snippet(body: &str) -> String {
    const MAX: usize = 200;
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    flat.chars().take(MAX).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rate_limit_is_retryable() {
        let rl = LlmError::from(ProviderError::RateLimited {
            retry_after_secs: Some(2),
        });
        assert!(rl.is_rate_limited());

        for e in [
            LlmError::from(ProviderError::Unauthorized),
            LlmError::from(ProviderError::Server(503)),
            LlmError::from(ProviderError::EmptyChoices),
            LlmError::from(ConfigError::MissingVar("OPENAI_API_KEY")),
        ] {
            assert!(!e.is_rate_limited(), "{e}");
        }
    }

    #[test]
    fn messages_carry_the_attribution_tag() {
        let cases: [LlmError; 3] = [
            ProviderError::Unauthorized.into(),
            ProviderError::Server(503).into(),
            ConfigError::MissingVar("OPENAI_API_KEY").into(),
        ];
        for e in cases {
            assert!(e.to_string().starts_with("[LLM Service] "), "{e}");
        }
    }

    #[test]
    fn snippet_is_flat_and_bounded() {
        let body = "line one\nline   two\n".repeat(100);
        let s = make_snippet(&body);
        assert!(s.len() <= 200);
        assert!(!s.contains('\n'));
    }
}
