use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

use crate::errors::ConfigError;

/// Adapter configuration module
/// This module handles AI provider configuration: the provider identifier,
/// per-provider defaults, and loading of process-wide secrets from the
/// environment.
/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    // @provider: OpenAI (and OpenAI-compatible servers)
    #[default]
    OpenAI,
    // @provider: Anthropic
    Anthropic,
    // @provider: Ollama (local LLM)
    Ollama,
}

impl ProviderKind {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
        }
    }

    // @returns: Prefix used for this provider's environment variables
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI",
            Self::Anthropic => "ANTHROPIC",
            Self::Ollama => "OLLAMA",
        }
    }

    /// Whether this provider requires an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow::anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Configuration for a single provider adapter.
///
/// Either supplied explicitly per call (the factory then builds a fresh,
/// uncached adapter) or loaded once from the process environment via
/// [`AdapterConfig::from_env`].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdapterConfig {
    /// Provider identifier
    pub provider: ProviderKind,

    /// API key (may be empty for local providers)
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Model name
    #[serde(default = "String::new")]
    pub model: String,

    /// Temperature for generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum number of tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Service endpoint URL override
    #[serde(default)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl AdapterConfig {
    /// Create a configuration with per-provider defaults and the given key.
    pub fn new(provider: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: default_model_for(provider),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Load the process-wide default configuration for a provider.
    ///
    /// Reads `<PROVIDER>_API_KEY`, `<PROVIDER>_DEFAULT_MODEL` and
    /// `<PROVIDER>_BASE_URL`. A hosted provider with no API key in the
    /// environment is a fatal configuration error, never silently defaulted.
    pub fn from_env(provider: ProviderKind) -> Result<Self, ConfigError> {
        let prefix = provider.env_prefix();
        let key_var = format!("{}_API_KEY", prefix);

        let api_key = match env::var(&key_var) {
            Ok(key) if !key.trim().is_empty() => key,
            _ if provider.requires_api_key() => {
                return Err(ConfigError::MissingSecret {
                    provider: provider.to_string(),
                    variable: key_var,
                });
            }
            _ => String::new(),
        };

        let model = env::var(format!("{}_DEFAULT_MODEL", prefix))
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_model_for(provider));

        let base_url = env::var(format!("{}_BASE_URL", prefix))
            .ok()
            .filter(|u| !u.trim().is_empty());

        Ok(Self {
            provider,
            api_key,
            model,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            base_url,
            timeout_secs: default_timeout_secs(),
        })
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the endpoint URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Resolve the endpoint for this adapter, falling back to the
    /// provider's public API when no override is configured.
    pub fn endpoint(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => default_endpoint_for(self.provider).to_string(),
        }
    }

    /// Validate that this configuration can be turned into an adapter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.requires_api_key() && self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingSecret {
                provider: self.provider.to_string(),
                variable: format!("{}_API_KEY", self.provider.env_prefix()),
            });
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::MissingModel(self.provider.to_string()));
        }
        if let Some(base_url) = &self.base_url {
            url::Url::parse(base_url).map_err(|e| {
                ConfigError::Invalid(format!("invalid base URL '{}': {}", base_url, e))
            })?;
        }
        Ok(())
    }
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_model_for(provider: ProviderKind) -> String {
    match provider {
        ProviderKind::OpenAI => "gpt-4o-mini".to_string(),
        ProviderKind::Anthropic => "claude-3-haiku-20240307".to_string(),
        ProviderKind::Ollama => "llama2".to_string(),
    }
}

fn default_endpoint_for(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::OpenAI => "https://api.openai.com/v1",
        ProviderKind::Anthropic => "https://api.anthropic.com",
        ProviderKind::Ollama => "http://localhost:11434",
    }
}
