//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SITEX_*)
//! 2. Unprefixed provider key variables (GOOGLE_API_KEY, OPENAI_API_KEY, ...)
//! 3. TOML config file (if SITEX_CONFIG_FILE set)
//! 4. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::provider::{GenerationParams, ProviderCredentials, ProviderId};

mod validation;

pub use validation::ConfigError;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "SITEX_";

/// Environment variable naming an optional TOML config file.
pub const CONFIG_FILE_ENV: &str = "SITEX_CONFIG_FILE";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SITEX_*)
/// 2. Unprefixed provider key variables (GOOGLE_API_KEY, OPENAI_API_KEY, ...)
/// 3. TOML config file (if SITEX_CONFIG_FILE set)
/// 4. Built-in defaults
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Google Gemini API key (SITEX_GOOGLE_API_KEY).
    #[serde(default)]
    pub google_api_key: Option<String>,

    /// OpenAI API key (SITEX_OPENAI_API_KEY).
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// Anthropic API key (SITEX_ANTHROPIC_API_KEY).
    #[serde(default)]
    pub anthropic_api_key: Option<String>,

    /// Groq API key (SITEX_GROQ_API_KEY).
    #[serde(default)]
    pub groq_api_key: Option<String>,

    /// SiliconFlow API key (SITEX_SILICONFLOW_API_KEY).
    #[serde(default)]
    pub siliconflow_api_key: Option<String>,

    /// iFlytek Xunfei MaaS API key (SITEX_XUNFEI_API_KEY).
    #[serde(default)]
    pub xunfei_api_key: Option<String>,

    /// Cerebras API key (SITEX_CEREBRAS_API_KEY).
    #[serde(default)]
    pub cerebras_api_key: Option<String>,

    /// Model override applied to whichever provider is selected.
    ///
    /// Set via SITEX_MODEL_NAME environment variable.
    #[serde(default)]
    pub model_name: Option<String>,

    /// Sampling temperature (0.0 keeps extraction deterministic).
    #[serde(default)]
    pub temperature: f32,

    /// Maximum tokens the model may generate per call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Timeout for a single model call in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Whether Chromium runs headless.
    ///
    /// Set via SITEX_BROWSER_HEADLESS environment variable.
    #[serde(default = "default_true")]
    pub browser_headless: bool,

    /// Budget for one page navigation in milliseconds.
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Budget for one wait-for-selector call in milliseconds.
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    /// Optional file replacing the built-in system prompt.
    #[serde(default)]
    pub system_prompt_file: Option<PathBuf>,
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

fn default_true() -> bool {
    true
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}

fn default_wait_timeout_ms() -> u64 {
    10_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            openai_api_key: None,
            anthropic_api_key: None,
            groq_api_key: None,
            siliconflow_api_key: None,
            xunfei_api_key: None,
            cerebras_api_key: None,
            model_name: None,
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            request_timeout_ms: default_request_timeout_ms(),
            browser_headless: true,
            navigation_timeout_ms: default_navigation_timeout_ms(),
            wait_timeout_ms: default_wait_timeout_ms(),
            system_prompt_file: None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("providers", &self.credentials().configured())
            .field("model_name", &self.model_name)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("browser_headless", &self.browser_headless)
            .field("navigation_timeout_ms", &self.navigation_timeout_ms)
            .field("wait_timeout_ms", &self.wait_timeout_ms)
            .field("system_prompt_file", &self.system_prompt_file)
            .finish()
    }
}

impl AppConfig {
    /// Model call timeout as Duration for use with reqwest.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SITEX_`
    /// 2. Provider key variables under their conventional names, e.g. `GOOGLE_API_KEY`
    /// 3. TOML file from `SITEX_CONFIG_FILE` (if set)
    /// 4. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);
        Self::load_from(file.as_deref())
    }

    /// Same as [`AppConfig::load`] with an explicit TOML file instead of `SITEX_CONFIG_FILE`.
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        let key_names: Vec<&str> = ProviderId::ALL.iter().map(|p| p.credential_field()).collect();
        figment = figment.merge(Env::raw().only(&key_names)).merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Build the immutable credential bag handed to the extraction agent.
    pub fn credentials(&self) -> ProviderCredentials {
        let params = GenerationParams {
            model_name: self.model_name.clone().filter(|m| !m.trim().is_empty()),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        ProviderId::ALL
            .into_iter()
            .fold(ProviderCredentials::new(params), |creds, provider| {
                creds.with_optional_key(provider, self.api_key(provider))
            })
    }

    /// Check that at least one provider key is available.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoCredentials` listing every recognised field.
    pub fn require_credentials(&self) -> Result<ProviderCredentials, ConfigError> {
        let creds = self.credentials();
        if creds.is_empty() {
            return Err(ConfigError::no_credentials());
        }
        Ok(creds)
    }

    fn api_key(&self, provider: ProviderId) -> Option<&str> {
        let key = match provider {
            ProviderId::Gemini => &self.google_api_key,
            ProviderId::OpenAi => &self.openai_api_key,
            ProviderId::Anthropic => &self.anthropic_api_key,
            ProviderId::Groq => &self.groq_api_key,
            ProviderId::SiliconFlow => &self.siliconflow_api_key,
            ProviderId::Xunfei => &self.xunfei_api_key,
            ProviderId::Cerebras => &self.cerebras_api_key,
        };
        key.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_tokens, 2000);
        assert_eq!(config.request_timeout_ms, 60_000);
        assert!(config.browser_headless);
        assert_eq!(config.navigation_timeout_ms, 30_000);
        assert_eq!(config.wait_timeout_ms, 10_000);
        assert!(config.model_name.is_none());
        assert!(config.credentials().is_empty());
    }

    #[test]
    fn test_timeout_durations() {
        let config = AppConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_millis(60_000));
        assert_eq!(config.navigation_timeout(), Duration::from_millis(30_000));
        assert_eq!(config.wait_timeout(), Duration::from_millis(10_000));
    }

    #[test]
    fn test_credentials_maps_fields() {
        let config = AppConfig {
            google_api_key: Some("g".into()),
            xunfei_api_key: Some("x".into()),
            openai_api_key: Some(String::new()),
            model_name: Some("custom-model".into()),
            temperature: 0.3,
            ..Default::default()
        };
        let creds = config.credentials();
        assert_eq!(creds.configured(), vec![ProviderId::Gemini, ProviderId::Xunfei]);
        assert_eq!(creds.params().model_name.as_deref(), Some("custom-model"));
        assert_eq!(creds.params().temperature, 0.3);
    }

    #[test]
    fn test_require_credentials_missing() {
        let config = AppConfig::default();
        let result = config.require_credentials();
        assert!(matches!(result, Err(ConfigError::NoCredentials { .. })));
    }

    #[test]
    fn test_debug_hides_keys() {
        let config = AppConfig { openai_api_key: Some("sk-very-secret".into()), ..Default::default() };
        assert!(!format!("{config:?}").contains("sk-very-secret"));
    }

    #[test]
    fn test_load_layers_env_over_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("sitex.toml", "temperature = 0.5\nmodel_name = \"from-file\"\nmax_tokens = 512\n")?;
            jail.set_env("SITEX_MODEL_NAME", "from-env");
            jail.set_env("SITEX_GROQ_API_KEY", "gsk");

            let config = AppConfig::load_from(Some(Path::new("sitex.toml"))).expect("config loads");
            assert_eq!(config.model_name.as_deref(), Some("from-env"));
            assert_eq!(config.temperature, 0.5);
            assert_eq!(config.max_tokens, 512);
            assert_eq!(config.groq_api_key.as_deref(), Some("gsk"));
            Ok(())
        });
    }

    #[test]
    fn test_load_reads_unprefixed_key_names() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GOOGLE_API_KEY", "g-raw");
            jail.set_env("CEREBRAS_API_KEY", "c-raw");
            jail.set_env("TEMPERATURE", "1.5");

            let config = AppConfig::load_from(None).expect("config loads");
            assert_eq!(config.google_api_key.as_deref(), Some("g-raw"));
            assert_eq!(config.cerebras_api_key.as_deref(), Some("c-raw"));
            assert_eq!(config.temperature, 0.0);
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_key_beats_unprefixed() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("sitex.toml", "openai_api_key = \"from-file\"\n")?;
            jail.set_env("OPENAI_API_KEY", "sk-raw");
            jail.set_env("SITEX_OPENAI_API_KEY", "sk-prefixed");

            let config = AppConfig::load_from(Some(Path::new("sitex.toml"))).expect("config loads");
            assert_eq!(config.openai_api_key.as_deref(), Some("sk-prefixed"));
            Ok(())
        });
    }

    #[test]
    fn test_unprefixed_key_beats_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("sitex.toml", "groq_api_key = \"from-file\"\n")?;
            jail.set_env("GROQ_API_KEY", "gsk-raw");

            let config = AppConfig::load_from(Some(Path::new("sitex.toml"))).expect("config loads");
            assert_eq!(config.groq_api_key.as_deref(), Some("gsk-raw"));
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SITEX_TEMPERATURE", "3.5");
            let result = AppConfig::load_from(None);
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "temperature"));
            Ok(())
        });
    }
}
