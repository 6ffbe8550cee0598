//! Language-model provider identifiers and credentials.
//!
//! The set of providers is closed. [`ProviderId::ALL`] lists them in resolution
//! priority order: the first provider carrying a non-empty secret wins.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A supported language-model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Gemini,
    OpenAi,
    Anthropic,
    Groq,
    SiliconFlow,
    Xunfei,
    Cerebras,
}

/// Calling convention spoken by a provider's HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// `POST /chat/completions` with bearer auth.
    OpenAiCompatible,
    /// `POST /messages` with `x-api-key`.
    Anthropic,
    /// `POST /models/{model}:generateContent` with an `x-goog-api-key` header.
    Gemini,
}

impl ProviderId {
    /// All providers in resolution priority order.
    pub const ALL: [ProviderId; 7] = [
        ProviderId::Gemini,
        ProviderId::OpenAi,
        ProviderId::Anthropic,
        ProviderId::Groq,
        ProviderId::SiliconFlow,
        ProviderId::Xunfei,
        ProviderId::Cerebras,
    ];

    /// Short lowercase identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini",
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::Groq => "groq",
            ProviderId::SiliconFlow => "siliconflow",
            ProviderId::Xunfei => "xunfei",
            ProviderId::Cerebras => "cerebras",
        }
    }

    /// Name of the configuration field that carries this provider's secret.
    pub fn credential_field(self) -> &'static str {
        match self {
            ProviderId::Gemini => "google_api_key",
            ProviderId::OpenAi => "openai_api_key",
            ProviderId::Anthropic => "anthropic_api_key",
            ProviderId::Groq => "groq_api_key",
            ProviderId::SiliconFlow => "siliconflow_api_key",
            ProviderId::Xunfei => "xunfei_api_key",
            ProviderId::Cerebras => "cerebras_api_key",
        }
    }

    pub fn wire_format(self) -> WireFormat {
        match self {
            ProviderId::Gemini => WireFormat::Gemini,
            ProviderId::Anthropic => WireFormat::Anthropic,
            ProviderId::OpenAi | ProviderId::Groq | ProviderId::SiliconFlow | ProviderId::Xunfei | ProviderId::Cerebras => {
                WireFormat::OpenAiCompatible
            }
        }
    }

    /// Model used when no override is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini-2.5-flash",
            ProviderId::OpenAi => "gpt-4o-mini",
            ProviderId::Anthropic => "claude-3-5-haiku-latest",
            ProviderId::Groq => "llama-3.3-70b-versatile",
            ProviderId::SiliconFlow => "Qwen/Qwen2.5-7B-Instruct",
            ProviderId::Xunfei => "xdeepseekv3",
            ProviderId::Cerebras => "llama3.1-8b",
        }
    }

    /// Fixed endpoint for providers that borrow the OpenAI-compatible convention.
    ///
    /// `None` means the backend's built-in default endpoint is used.
    pub fn custom_endpoint(self) -> Option<&'static str> {
        match self {
            ProviderId::SiliconFlow => Some("https://api.siliconflow.cn/v1"),
            ProviderId::Xunfei => Some("https://maas-api.cn-huabei-1.xf-yun.com/v2"),
            ProviderId::Cerebras => Some("https://api.cerebras.ai/v1"),
            _ => None,
        }
    }

    /// Comma-separated list of every credential field, in priority order.
    pub fn credential_fields() -> String {
        Self::ALL.iter().map(|p| p.credential_field()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation parameters shared by every provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Overrides the provider's default model when set.
    pub model_name: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self { model_name: None, temperature: 0.0, max_tokens: 2000 }
    }
}

/// Immutable bag of provider secrets plus generation parameters.
///
/// Secrets are never printed by the `Debug` implementation.
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    keys: BTreeMap<ProviderId, String>,
    params: GenerationParams,
}

impl ProviderCredentials {
    pub fn new(params: GenerationParams) -> Self {
        Self { keys: BTreeMap::new(), params }
    }

    /// Attach a secret for `provider`. Empty or whitespace-only secrets are ignored.
    pub fn with_key(mut self, provider: ProviderId, key: impl Into<String>) -> Self {
        let key = key.into();
        if !key.trim().is_empty() {
            self.keys.insert(provider, key);
        }
        self
    }

    /// Attach a secret if one is present.
    pub fn with_optional_key(self, provider: ProviderId, key: Option<&str>) -> Self {
        match key {
            Some(k) => self.with_key(provider, k),
            None => self,
        }
    }

    pub fn key(&self, provider: ProviderId) -> Option<&str> {
        self.keys.get(&provider).map(String::as_str)
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Providers that carry a secret, in priority order.
    pub fn configured(&self) -> Vec<ProviderId> {
        ProviderId::ALL.into_iter().filter(|p| self.keys.contains_key(p)).collect()
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("configured", &self.configured())
            .field("params", &self.params)
            .finish()
    }
}
