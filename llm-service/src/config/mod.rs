pub mod llm_model_config;
pub mod llm_provider;
