//! Provider (backend) selection for recommendation generation.

use crate::error_handler::{ConfigError, Result};

/// The text-generation backend active for this run.
///
/// Both backends expose the OpenAI-compatible chat-completions API; they
/// differ only in endpoint, credential, and default model. Adding another
/// OpenAI-compatible provider means extending this enum and its tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// OpenAI API.
    OpenAi,
    /// DeepSeek API (OpenAI-compatible).
    DeepSeek,
}

impl LlmProvider {
    /// Parses the `MODEL_PROVIDER` selector (case-insensitive).
    ///
    /// # Errors
    /// Returns [`ConfigError::UnsupportedProvider`] for anything other
    /// than `openai` or `deepseek`.
    pub fn from_selector(selector: &str) -> Result<Self> {
        match selector.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "deepseek" => Ok(LlmProvider::DeepSeek),
            other => Err(ConfigError::UnsupportedProvider(other.to_string()).into()),
        }
    }

    /// Environment variable holding this backend's API key.
    pub fn credential_var(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    /// Default model when `LLM_MODEL` is unset.
    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "gpt-4.1",
            LlmProvider::DeepSeek => "deepseek-chat",
        }
    }

    /// Default chat-completions base endpoint.
    pub fn default_endpoint(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "https://api.openai.com/v1",
            LlmProvider::DeepSeek => "https://api.deepseek.com",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_parsing() {
        assert_eq!(
            LlmProvider::from_selector("openai").unwrap(),
            LlmProvider::OpenAi
        );
        assert_eq!(
            LlmProvider::from_selector("DeepSeek").unwrap(),
            LlmProvider::DeepSeek
        );
        assert!(LlmProvider::from_selector("mistral").is_err());
        assert!(LlmProvider::from_selector("").is_err());
    }

    #[test]
    fn provider_tables() {
        assert_eq!(LlmProvider::OpenAi.credential_var(), "OPENAI_API_KEY");
        assert_eq!(LlmProvider::DeepSeek.default_model(), "deepseek-chat");
        assert!(LlmProvider::DeepSeek.default_endpoint().starts_with("https://"));
    }
}
