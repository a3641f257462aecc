//! Server configuration
//!
//! Non-secret settings come from an optional YAML file with CLI overrides;
//! the two secrets come strictly from the environment and the process refuses
//! to start without them.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tickettriage_core::Error;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Inference provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Per-address rate limiting settings
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

impl ServerConfig {
    /// Load configuration from file and apply CLI overrides
    pub fn load(config_path: &str, model_override: Option<&str>) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        if let Some(model) = model_override {
            config.provider.model = model.to_string();
        }

        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            rate_limit: RateLimitSettings::default(),
        }
    }
}

/// Inference provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Total attempt budget for schema-conformance retries
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Per-attempt request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Rate limiting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Requests allowed per window per client address
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

/// Required secret values, resolved from the environment at startup
#[derive(Clone)]
pub struct Secrets {
    /// Inference provider API key
    pub openai_api_key: String,

    /// Key callers must present in the X-API-Key header
    pub service_api_key: String,
}

impl Secrets {
    /// Read both secrets from the environment.
    ///
    /// Fails if either is absent so the process never starts half-configured.
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            service_api_key: require_env("SERVICE_API_KEY")?,
        })
    }
}

impl std::fmt::Debug for Secrets {
    // Keys never appear in logs or panic messages
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("openai_api_key", &"<redacted>")
            .field("service_api_key", &"<redacted>")
            .finish()
    }
}

fn require_env(name: &str) -> Result<String, Error> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::config(format!("{name} must be set"))),
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_requests() -> u32 {
    10
}

fn default_window_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.provider.max_attempts, 3);
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.window_secs, 60);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: ServerConfig = serde_yaml::from_str(
            r#"
provider:
  model: gpt-4o
"#,
        )
        .unwrap();
        assert_eq!(config.provider.model, "gpt-4o");
        assert_eq!(config.provider.base_url, "https://api.openai.com/v1");
        assert_eq!(config.rate_limit.max_requests, 10);
    }

    #[test]
    fn test_secrets_debug_is_redacted() {
        let secrets = Secrets {
            openai_api_key: "sk-secret".to_string(),
            service_api_key: "svc-secret".to_string(),
        };
        let rendered = format!("{:?}", secrets);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
