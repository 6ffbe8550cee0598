//! Provider resolution.
//!
//! Picks exactly one backend from the available credentials. The first
//! provider in [`ProviderId::ALL`] that both carries a secret and is present in
//! the [`BackendRegistry`] wins.

use std::collections::BTreeSet;
use std::fmt;

use sitex_core::{ConfigError, ProviderCredentials, ProviderId};

/// Set of providers this build is able to call.
///
/// Built once at startup and passed to [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRegistry {
    enabled: BTreeSet<ProviderId>,
}

impl BackendRegistry {
    /// Every provider with a compiled-in client.
    pub fn builtin() -> Self {
        Self::with_providers(ProviderId::ALL)
    }

    pub fn with_providers(providers: impl IntoIterator<Item = ProviderId>) -> Self {
        Self { enabled: providers.into_iter().collect() }
    }

    pub fn supports(&self, provider: ProviderId) -> bool {
        self.enabled.contains(&provider)
    }

    /// Remove a provider, e.g. to disable it by policy.
    pub fn without(mut self, provider: ProviderId) -> Self {
        self.enabled.remove(&provider);
        self
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// The single backend chosen for one extraction agent.
#[derive(Clone, PartialEq)]
pub struct ResolvedBackend {
    pub provider: ProviderId,
    api_key: String,
    /// Effective model name (override or provider default).
    pub model: String,
    /// Fixed endpoint for providers that borrow another convention.
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ResolvedBackend {
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    #[cfg(test)]
    pub(crate) fn for_test(provider: ProviderId) -> Self {
        Self {
            provider,
            api_key: "test-key".into(),
            model: provider.default_model().into(),
            base_url: provider.custom_endpoint().map(str::to_string),
            temperature: 0.0,
            max_tokens: 256,
        }
    }
}

impl fmt::Debug for ResolvedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedBackend")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Select one backend by fixed priority order.
///
/// # Errors
///
/// Returns `ConfigError::NoCredentials`, listing every recognised credential
/// field, when no supported provider carries a secret.
pub fn resolve(credentials: &ProviderCredentials, registry: &BackendRegistry) -> Result<ResolvedBackend, ConfigError> {
    let params = credentials.params();

    let (provider, api_key) = ProviderId::ALL
        .into_iter()
        .filter(|p| registry.supports(*p))
        .find_map(|p| credentials.key(p).map(|key| (p, key)))
        .ok_or_else(ConfigError::no_credentials)?;

    let model = params
        .model_name
        .clone()
        .unwrap_or_else(|| provider.default_model().to_string());

    tracing::debug!(provider = %provider, model = %model, "resolved language-model backend");

    Ok(ResolvedBackend {
        provider,
        api_key: api_key.to_string(),
        model,
        base_url: provider.custom_endpoint().map(str::to_string),
        temperature: params.temperature,
        max_tokens: params.max_tokens,
    })
}
