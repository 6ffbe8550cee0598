//! Language-model backends.
//!
//! A backend is one calling convention (endpoint + model id + secret). The
//! extraction agent only sees the [`ChatModel`] capability; [`Backend`] is the
//! tagged union of the concrete HTTP clients, chosen by the provider resolver.
//!
//! ### Wire formats
//! - OpenAI-compatible `chat/completions` (OpenAI, Groq, SiliconFlow, Xunfei, Cerebras)
//! - Anthropic `messages`
//! - Gemini `generateContent`

pub mod anthropic;
pub mod error;
pub mod gemini;
pub mod openai;
pub mod resolve;

pub use anthropic::AnthropicClient;
pub use error::BackendError;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use resolve::{BackendRegistry, ResolvedBackend, resolve};

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sitex_core::WireFormat;

/// Default timeout for one model call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Human,
    Assistant,
}

/// One message in a conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self { role: Role::Human, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// API key that never shows up in `Debug` output.
#[derive(Clone)]
pub(crate) struct Secret(String);

impl Secret {
    pub(crate) fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Split a history into the joined system prompt and the remaining turns.
///
/// Used by the wire formats that carry the system prompt outside the message list.
pub(crate) fn split_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
    let (system, turns): (Vec<&Message>, Vec<&Message>) = messages.iter().partition(|m| m.role == Role::System);
    let prompt = if system.is_empty() {
        None
    } else {
        Some(system.iter().map(|m| m.content.as_str()).collect::<Vec<_>>().join("\n\n"))
    };
    (prompt, turns)
}

/// Capability to turn a conversation into response text.
///
/// Any type with this shape can stand in for a real provider.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the full history and return the response text.
    async fn complete(&self, messages: &[Message]) -> Result<String, BackendError>;
}

/// Concrete backend selected by the provider resolver.
#[derive(Debug, Clone)]
pub enum Backend {
    OpenAiCompatible(OpenAiClient),
    Anthropic(AnthropicClient),
    Gemini(GeminiClient),
}

impl Backend {
    /// Build the HTTP client matching the resolved provider's wire format.
    pub fn from_resolved(resolved: &ResolvedBackend, timeout: Duration) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .use_rustls_tls()
            .gzip(true)
            .build()?;

        let backend = match resolved.provider.wire_format() {
            WireFormat::OpenAiCompatible => Backend::OpenAiCompatible(OpenAiClient::new(http, resolved)),
            WireFormat::Anthropic => Backend::Anthropic(AnthropicClient::new(http, resolved)),
            WireFormat::Gemini => Backend::Gemini(GeminiClient::new(http, resolved)),
        };

        Ok(backend)
    }
}

#[async_trait::async_trait]
impl ChatModel for Backend {
    async fn complete(&self, messages: &[Message]) -> Result<String, BackendError> {
        match self {
            Backend::OpenAiCompatible(client) => client.complete(messages).await,
            Backend::Anthropic(client) => client.complete(messages).await,
            Backend::Gemini(client) => client.complete(messages).await,
        }
    }
}

/// Send a prepared request and decode the JSON body, mapping failures to [`BackendError`].
pub(crate) async fn send_json(request: reqwest::RequestBuilder) -> Result<Value, BackendError> {
    let start = Instant::now();
    let response = request.send().await?;
    let status = response.status();

    tracing::debug!(status = status.as_u16(), elapsed_ms = start.elapsed().as_millis() as u64, "model response");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::from_status(status, &body));
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| BackendError::InvalidResponse(e.to_string()))
}

/// Join the `text` fields of an array of content parts.
pub(crate) fn join_text_parts(parts: &[Value]) -> String {
    parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("")
}
