//! OpenAI-compatible chat completions client.
//!
//! Serves OpenAI itself plus every provider that mirrors its API (Groq,
//! SiliconFlow, Xunfei, Cerebras); only the base URL differs.

use reqwest::header;
use serde_json::{Value, json};
use sitex_core::ProviderId;

use super::{BackendError, Message, ResolvedBackend, Role, Secret, join_text_parts, send_json};

/// Default base URL for OpenAI.
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Groq serves the OpenAI convention under its own prefix.
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Client for `POST {base}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Secret,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, resolved: &ResolvedBackend) -> Self {
        let base_url = resolved.base_url.clone().unwrap_or_else(|| {
            match resolved.provider {
                ProviderId::Groq => GROQ_BASE_URL,
                _ => OPENAI_BASE_URL,
            }
            .to_string()
        });

        Self {
            http,
            base_url,
            api_key: Secret::new(resolved.api_key()),
            model: resolved.model.clone(),
            temperature: resolved.temperature,
            max_tokens: resolved.max_tokens,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Request body for a conversation.
    pub fn request_body(&self, messages: &[Message]) -> Value {
        let messages: Vec<Value> = messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => "system",
                    Role::Human => "user",
                    Role::Assistant => "assistant",
                };
                json!({"role": role, "content": m.content})
            })
            .collect();

        json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
    }

    pub async fn complete(&self, messages: &[Message]) -> Result<String, BackendError> {
        tracing::debug!(model = %self.model, endpoint = %self.endpoint(), "calling chat completions");

        let request = self
            .http
            .post(self.endpoint())
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key.expose()))
            .json(&self.request_body(messages));

        let body = send_json(request).await?;
        response_text(&body)
    }
}

/// Text of the first choice; content may be a string or an array of parts.
pub fn response_text(body: &Value) -> Result<String, BackendError> {
    let content = body
        .pointer("/choices/0/message/content")
        .ok_or_else(|| BackendError::InvalidResponse("missing choices[0].message.content".into()))?;

    match content {
        Value::String(text) => Ok(text.clone()),
        Value::Array(parts) => Ok(join_text_parts(parts)),
        Value::Null => Ok(String::new()),
        other => Err(BackendError::InvalidResponse(format!("unexpected content type: {other}"))),
    }
}
