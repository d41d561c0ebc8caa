//! Model invocation configuration, assembled from the environment.

use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{ConfigError, Result, must_env};

/// Configuration for a model invocation.
#[derive(Debug, Clone)]
pub struct LlmModelConfig {
    /// Which backend to use.
    pub provider: LlmProvider,
    /// Model identifier (e.g. `gpt-4.1`, `deepseek-chat`).
    pub model: String,
    /// Chat-completions base endpoint.
    pub endpoint: String,
    /// API key for the selected backend.
    pub api_key: String,
    /// Sampling temperature; 0.0 keeps recommendations deterministic.
    pub temperature: f32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl LlmModelConfig {
    /// Builds the config from environment variables.
    ///
    /// - `MODEL_PROVIDER` — backend selector, default `openai`.
    /// - `OPENAI_API_KEY` / `DEEPSEEK_API_KEY` — credential for the
    ///   *selected* backend; missing is fatal at startup.
    /// - `LLM_MODEL`, `LLM_ENDPOINT` — optional overrides.
    /// - `LLM_TEMPERATURE` — default `0.0`, must lie in `0.0..=2.0`.
    ///
    /// # Errors
    /// Returns [`crate::LlmError::Config`] for an unsupported selector, a
    /// missing credential, a non-HTTP endpoint, or an out-of-range
    /// temperature.
    pub fn from_env() -> Result<Self> {
        let selector = std::env::var("MODEL_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let provider = LlmProvider::from_selector(&selector)?;

        let api_key = must_env(provider.credential_var())?;

        let model =
            std::env::var("LLM_MODEL").unwrap_or_else(|_| provider.default_model().to_string());
        let endpoint = std::env::var("LLM_ENDPOINT")
            .unwrap_or_else(|_| provider.default_endpoint().to_string());

        let temperature = match std::env::var("LLM_TEMPERATURE") {
            Ok(v) if !v.trim().is_empty() => v.trim().parse::<f32>().map_err(|_| {
                ConfigError::InvalidFormat {
                    var: "LLM_TEMPERATURE",
                    reason: "expected f32",
                }
            })?,
            _ => 0.0,
        };

        let cfg = Self {
            provider,
            model,
            endpoint,
            api_key,
            temperature,
            timeout_secs: 60,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates endpoint scheme and temperature range.
    pub fn validate(&self) -> Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidFormat {
                var: "LLM_ENDPOINT",
                reason: "must start with http:// or https://",
            }
            .into());
        }
        if !(self.temperature.is_finite() && (0.0..=2.0).contains(&self.temperature)) {
            return Err(ConfigError::OutOfRange {
                field: "temperature",
                detail: "expected 0.0..=2.0",
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::OpenAi,
            model: "gpt-4.1".into(),
            endpoint: "https://api.openai.com/v1".into(),
            api_key: "sk-test".into(),
            temperature: 0.0,
            timeout_secs: 60,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(cfg().validate().is_ok());
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let mut c = cfg();
        c.endpoint = "ftp://example.com".into();
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let mut c = cfg();
        c.temperature = 3.5;
        assert!(c.validate().is_err());
        c.temperature = f32::NAN;
        assert!(c.validate().is_err());
    }
}
