//! Anthropic Messages API client.

use serde_json::{Value, json};

use super::{BackendError, Message, ResolvedBackend, Role, Secret, join_text_parts, send_json, split_system};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for `POST {base}/messages`.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Secret,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client, resolved: &ResolvedBackend) -> Self {
        Self {
            http,
            base_url: resolved.base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: Secret::new(resolved.api_key()),
            model: resolved.model.clone(),
            temperature: resolved.temperature,
            max_tokens: resolved.max_tokens,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/messages", self.base_url.trim_end_matches('/'))
    }

    /// Request body; system messages move to the top-level `system` field.
    pub fn request_body(&self, messages: &[Message]) -> Value {
        let (system, turns) = split_system(messages);

        let messages: Vec<Value> = turns
            .into_iter()
            .map(|m| {
                let role = if m.role == Role::Assistant { "assistant" } else { "user" };
                json!({"role": role, "content": [{"type": "text", "text": m.content}]})
            })
            .collect();

        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": messages,
        });
        if let Some(system) = system {
            body["system"] = json!(system);
        }
        body
    }

    pub async fn complete(&self, messages: &[Message]) -> Result<String, BackendError> {
        tracing::debug!(model = %self.model, "calling anthropic messages");

        let request = self
            .http
            .post(self.endpoint())
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(messages));

        let body = send_json(request).await?;
        response_text(&body)
    }
}

/// Joined text blocks of a Messages API response.
pub fn response_text(body: &Value) -> Result<String, BackendError> {
    body.get("content")
        .and_then(Value::as_array)
        .map(|parts| join_text_parts(parts))
        .ok_or_else(|| BackendError::InvalidResponse("missing content array".into()))
}
