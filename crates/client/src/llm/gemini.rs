//! Google Gemini `generateContent` client.

use serde_json::{Value, json};

use super::{BackendError, Message, ResolvedBackend, Role, Secret, join_text_parts, send_json, split_system};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for `POST {base}/models/{model}:generateContent`.
///
/// The key travels in the `x-goog-api-key` header so it never appears in a
/// request URL, and therefore never in a transport error message.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Secret,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GeminiClient {
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
        format!("{}/models/{}:generateContent", self.base_url.trim_end_matches('/'), self.model)
    }

    /// Request body; the assistant role is called `model` on this API.
    pub fn request_body(&self, messages: &[Message]) -> Value {
        let (system, turns) = split_system(messages);

        let contents: Vec<Value> = turns
            .into_iter()
            .map(|m| {
                let role = if m.role == Role::Assistant { "model" } else { "user" };
                json!({"role": role, "parts": [{"text": m.content}]})
            })
            .collect();

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_tokens,
            },
        });
        if let Some(system) = system {
            body["system_instruction"] = json!({"parts": [{"text": system}]});
        }
        body
    }

    fn request(&self, messages: &[Message]) -> reqwest::RequestBuilder {
        self.http
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose())
            .json(&self.request_body(messages))
    }

    pub async fn complete(&self, messages: &[Message]) -> Result<String, BackendError> {
        tracing::debug!(model = %self.model, "calling gemini generateContent");

        let body = send_json(self.request(messages)).await?;
        response_text(&body)
    }
}

/// Joined text parts of the first candidate.
pub fn response_text(body: &Value) -> Result<String, BackendError> {
    body.pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| join_text_parts(parts))
        .ok_or_else(|| {
            let reason = body
                .pointer("/promptFeedback/blockReason")
                .and_then(Value::as_str)
                .unwrap_or("missing candidates[0].content.parts");
            BackendError::InvalidResponse(reason.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitex_core::ProviderId;

    fn client() -> GeminiClient {
        GeminiClient::new(reqwest::Client::new(), &ResolvedBackend::for_test(ProviderId::Gemini))
    }

    #[test]
    fn test_endpoint_includes_model() {
        assert_eq!(
            client().endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body() {
        let body = client().request_body(&[
            Message::system("rules"),
            Message::human("hi"),
            Message::assistant("hello"),
        ]);

        assert_eq!(body["system_instruction"]["parts"][0]["text"], "rules");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn test_key_sent_in_header_not_url() {
        let request = client().request(&[Message::human("hi")]).build().unwrap();

        assert!(request.url().query().is_none());
        assert!(!request.url().as_str().contains("test-key"));
        assert_eq!(request.headers()["x-goog-api-key"], "test-key");
    }

    #[test]
    fn test_response_text() {
        let body = json!({"candidates": [{"content": {"parts": [{"text": "{\"title\":"}, {"text": "\"x\"}"}]}}]});
        assert_eq!(response_text(&body).unwrap(), "{\"title\":\"x\"}");
    }

    #[test]
    fn test_response_text_blocked() {
        let body = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        match response_text(&body) {
            Err(BackendError::InvalidResponse(reason)) => assert_eq!(reason, "SAFETY"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
