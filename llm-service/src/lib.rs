//! Thin LLM provider layer for recommendation generation.
//!
//! One backend is active per run, selected by `MODEL_PROVIDER` at startup
//! (`openai` or `deepseek`). Both speak the OpenAI-compatible
//! chat-completions wire protocol, so a single HTTP service covers them;
//! only the endpoint, credential, and default model differ.
//!
//! Errors are unified in [`error_handler`]; rate-limit responses are
//! distinguished from other failures so the caller's retry policy can act
//! on them.

pub mod config;
pub mod error_handler;
pub mod services;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{LlmError, ProviderError};
pub use services::open_ai_service::OpenAiService;
