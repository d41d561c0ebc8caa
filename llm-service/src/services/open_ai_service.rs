//! OpenAI-compatible chat-completions client.
//!
//! Minimal, non-streaming client used by the enrichment pipeline. The same
//! service covers every supported backend, since all of them accept
//! `POST {endpoint}/chat/completions` with the standard request shape.
//!
//! Constructor validation:
//! - `cfg.api_key` must be non-empty
//! - `cfg.endpoint` must start with http:// or https://
//!
//! Non-2xx responses are normalized into [`ProviderError`]; HTTP 429 maps
//! to [`ProviderError::RateLimited`] (with a parsed `Retry-After` when the
//! server sent one) so callers can apply backoff.

use std::time::{Duration, Instant};

use reqwest::{StatusCode, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::llm_model_config::LlmModelConfig;
use crate::error_handler::{ConfigError, LlmError, ProviderError, make_snippet};

/// Thin client over an OpenAI-compatible chat-completions endpoint.
///
/// Keeps a preconfigured `reqwest::Client` (timeout + default headers) and
/// the precomputed request URL.
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl OpenAiService {
    /// Creates a new service from the given config.
    ///
    /// # Errors
    /// - [`LlmError::Config`] when the key is empty or the endpoint is not
    ///   an HTTP(S) URL
    /// - [`LlmError::HttpTransport`] when the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, LlmError> {
        cfg.validate()?;
        if cfg.api_key.trim().is_empty() {
            return Err(ConfigError::MissingVar(cfg.provider.credential_var()).into());
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", cfg.api_key)).map_err(|e| {
                LlmError::Provider(ProviderError::Decode(format!(
                    "invalid API key header: {e}"
                )))
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(headers)
            .build()?;

        let url_chat = format!("{}/chat/completions", cfg.endpoint.trim_end_matches('/'));

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout_secs,
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// Performs a single non-streaming chat completion and returns the
    /// trimmed text of the first choice.
    ///
    /// # Errors
    /// - [`ProviderError::RateLimited`] for HTTP 429
    /// - [`ProviderError::Unauthorized`] for HTTP 401/403
    /// - [`ProviderError::Server`] / [`ProviderError::HttpStatus`] for
    ///   other non-2xx statuses
    /// - [`ProviderError::Decode`] / [`ProviderError::EmptyChoices`] for
    ///   malformed or empty responses
    /// - [`LlmError::HttpTransport`] for client/network failures
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest {
            model: &self.cfg.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.cfg.temperature,
        };

        debug!(
            model = %self.cfg.model,
            prompt_len = prompt.len(),
            "POST {}", self.url_chat
        );

        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let retry_after = parse_retry_after(&resp);
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                url = %self.url_chat,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "chat completion returned non-success status"
            );

            return Err(classify_status(status, &self.url_chat, snippet, retry_after).into());
        }

        let out: ChatCompletionResponse = resp.json().await.map_err(|e| {
            ProviderError::Decode(format!(
                "serde error: {e}; expected `choices[0].message.content`"
            ))
        })?;

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or(ProviderError::EmptyChoices)?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "chat completion completed"
        );

        Ok(content.trim().to_string())
    }
}

/// Maps a non-success HTTP status onto a [`ProviderError`] class.
fn classify_status(
    status: StatusCode,
    url: &str,
    snippet: String,
    retry_after_secs: Option<u64>,
) -> ProviderError {
    match status.as_u16() {
        429 => ProviderError::RateLimited { retry_after_secs },
        401 | 403 => ProviderError::Unauthorized,
        500..=599 => ProviderError::Server(status.as_u16()),
        code => ProviderError::HttpStatus {
            status: code,
            url: url.to_string(),
            snippet,
        },
    }
}

fn parse_retry_after(resp: &reqwest::Response) -> Option<u64> {
    resp.headers()
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Minimal request body for `/chat/completions` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Minimal response for `/chat/completions`.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}
