/*!
 * Adapter factory and process-wide adapter registry.
 *
 * The registry caches one adapter instance per provider, created on first
 * use from the process environment. Callers that bring an explicit
 * configuration (per-tenant keys, tests) always get a fresh, uncached
 * instance instead. The registry lifecycle is an explicit `insert` /
 * `remove` API, never invalidated behind the caller's back, and factories are
 * independently constructible so tests never share state through the
 * global one.
 */

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::app_config::{AdapterConfig, ProviderKind};
use crate::errors::ConfigError;

use super::anthropic::AnthropicAdapter;
use super::ollama::OllamaAdapter;
use super::openai::OpenAiAdapter;
use super::AiProvider;

static GLOBAL_FACTORY: Lazy<Arc<AdapterFactory>> = Lazy::new(|| Arc::new(AdapterFactory::new()));

/// Factory returning capability-typed provider adapters.
#[derive(Default)]
pub struct AdapterFactory {
    registry: Mutex<HashMap<ProviderKind, Arc<dyn AiProvider>>>,
}

impl AdapterFactory {
    /// Create an empty factory with its own registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide factory instance.
    pub fn global() -> Arc<AdapterFactory> {
        GLOBAL_FACTORY.clone()
    }

    /// Build a fresh adapter from an explicit configuration.
    ///
    /// The instance is never cached; the configuration is validated first
    /// and an unusable one is a fatal error.
    pub fn build(config: AdapterConfig) -> Result<Arc<dyn AiProvider>, ConfigError> {
        config.validate()?;
        Ok(match config.provider {
            ProviderKind::OpenAI => Arc::new(OpenAiAdapter::new(config)),
            ProviderKind::Anthropic => Arc::new(AnthropicAdapter::new(config)),
            ProviderKind::Ollama => Arc::new(OllamaAdapter::new(config)),
        })
    }

    /// Resolve an adapter for a provider.
    ///
    /// With an explicit configuration the result is always a fresh,
    /// uncached instance. Otherwise the cached instance is returned, or
    /// created once from environment configuration; a missing required
    /// secret surfaces as a fatal [`ConfigError`].
    pub fn adapter(
        &self,
        provider: ProviderKind,
        explicit: Option<AdapterConfig>,
    ) -> Result<Arc<dyn AiProvider>, ConfigError> {
        if let Some(config) = explicit {
            return Self::build(config);
        }

        let mut registry = self.registry.lock();
        if let Some(adapter) = registry.get(&provider) {
            return Ok(adapter.clone());
        }

        let adapter = Self::build(AdapterConfig::from_env(provider)?)?;
        registry.insert(provider, adapter.clone());
        Ok(adapter)
    }

    /// Register (or replace) the cached adapter for its provider.
    pub fn insert(&self, adapter: Arc<dyn AiProvider>) {
        self.registry.lock().insert(adapter.kind(), adapter);
    }

    /// Remove the cached adapter for a provider. Returns whether one was
    /// cached.
    pub fn remove(&self, provider: ProviderKind) -> bool {
        self.registry.lock().remove(&provider).is_some()
    }

    /// Providers with a cached adapter.
    pub fn cached_providers(&self) -> Vec<ProviderKind> {
        self.registry.lock().keys().copied().collect()
    }
}
