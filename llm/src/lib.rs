//! Minimal chat-completions client for OpenAI-compatible providers.
//!
//! This crate provides a focused client for the `/chat/completions` API with:
//! - Groq and OpenAI endpoints selected by provider name
//! - Bounded retry with backoff on rate limiting (HTTP 429)
//! - A [`ChatService`] trait so callers can swap in scripted replies

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
const DEFAULT_MAX_TOKENS: usize = 350;
const DEFAULT_TEMPERATURE: f32 = 0.9;

/// Attempts per request before giving up on rate limiting.
const MAX_ATTEMPTS: usize = 3;

/// Wait used when a 429 carries no usable delay hint.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);
const MIN_RETRY_DELAY: Duration = Duration::from_secs(5);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(20);

/// Errors that can occur when using the chat client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured: set {0}")]
    NoApiKey(&'static str),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limit: too many tokens/min. Please wait a moment and try again.")]
    RateLimited,

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl Error {
    /// Whether retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::RateLimited | Error::Network(_))
    }
}

/// Supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Groq,
    OpenAi,
}

impl Provider {
    /// Parse a provider name (case-insensitive).
    pub fn parse(name: &str) -> Result<Self, Error> {
        match name.trim().to_lowercase().as_str() {
            "groq" => Ok(Provider::Groq),
            "openai" => Ok(Provider::OpenAi),
            other => Err(Error::Config(format!(
                "PROVIDER must be 'groq' or 'openai', got '{other}'"
            ))),
        }
    }

    fn api_base(self) -> &'static str {
        match self {
            Provider::Groq => GROQ_API_BASE,
            Provider::OpenAi => OPENAI_API_BASE,
        }
    }

    /// Environment variable holding this provider's key.
    pub fn key_var(self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Configuration for a [`ChatClient`].
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl ChatConfig {
    /// Create a config with default model and sampling settings.
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Read `PROVIDER`, `MODEL_NAME`, `MAX_TOKENS` and the provider's API key.
    pub fn from_env() -> Result<Self, Error> {
        let provider = Provider::parse(&std::env::var("PROVIDER").unwrap_or_else(|_| "groq".into()))?;
        let api_key = std::env::var(provider.key_var())
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(Error::NoApiKey(provider.key_var()))?;

        let mut config = Self::new(provider, api_key);
        if let Ok(model) = std::env::var("MODEL_NAME") {
            config.model = model;
        }
        if let Some(max_tokens) = std::env::var("MAX_TOKENS").ok().and_then(|v| v.parse().ok()) {
            config.max_tokens = max_tokens;
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Something that turns a conversation into a reply.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn chat(&self, messages: &[Message]) -> Result<String, Error>;
}

/// Chat-completions API client.
#[derive(Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    config: ChatConfig,
}

impl ChatClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ChatConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::new(ChatConfig::from_env()?)
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }

    fn build_api_request<'a>(&'a self, messages: &'a [Message]) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

#[async_trait]
impl ChatService for ChatClient {
    /// Send the conversation, retrying on rate limits.
    async fn chat(&self, messages: &[Message]) -> Result<String, Error> {
        let url = format!("{}/chat/completions", self.config.provider.api_base());
        let headers = self.build_headers()?;
        let body = self.build_api_request(messages);

        for attempt in 1..=MAX_ATTEMPTS {
            let response = self
                .client
                .post(&url)
                .headers(headers.clone())
                .json(&body)
                .send()
                .await
                .map_err(|e| Error::Network(e.to_string()))?;

            let status = response.status().as_u16();
            if status == 429 {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let text = response.text().await.unwrap_or_default();
                let delay = retry_delay(retry_after.as_deref(), &text);
                warn!(attempt, delay_secs = delay.as_secs_f32(), "Rate limited");
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(delay).await;
                }
                continue;
            }

            if status >= 400 {
                let message = response.text().await.unwrap_or_default();
                return Err(Error::Api { status, message });
            }

            let api_response: ApiResponse = response
                .json()
                .await
                .map_err(|e| Error::Parse(e.to_string()))?;
            debug!(attempt, "Chat completion received");
            return api_response
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or_else(|| Error::Parse("response had no choices".to_string()));
        }

        Err(Error::RateLimited)
    }
}

/// How long to wait after a 429.
///
/// Prefers an integer `Retry-After` header, then a `try again in <secs>s`
/// hint in the body, then a fixed default; the result is clamped to
/// 5..=20 seconds.
pub fn retry_delay(retry_after: Option<&str>, body: &str) -> Duration {
    let hinted = match retry_after {
        Some(value) => value.trim().parse::<u64>().ok().map(Duration::from_secs),
        None => parse_try_again(body),
    };
    hinted
        .unwrap_or(DEFAULT_RETRY_DELAY)
        .clamp(MIN_RETRY_DELAY, MAX_RETRY_DELAY)
}

fn parse_try_again(body: &str) -> Option<Duration> {
    const MARKER: &str = "try again in ";
    let start = body.find(MARKER)? + MARKER.len();
    let rest = &body[start..];
    let end = rest.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
    if !rest[end..].starts_with('s') {
        return None;
    }
    let secs: f64 = rest[..end].parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

// ============================================================================
// Public types
// ============================================================================

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    content: String,
}
