/*!
 * Tests for adapter configuration and the adapter registry.
 */

use std::sync::Arc;

use doctran::app_config::{AdapterConfig, ProviderKind};
use doctran::errors::ConfigError;
use doctran::providers::mock::MockProvider;
use doctran::providers::{AdapterFactory, AiProvider};

#[test]
fn test_fromEnv_missingSecret_shouldBeFatalForHostedProvider() {
    unsafe {
        std::env::remove_var("ANTHROPIC_API_KEY");
    }
    let result = AdapterConfig::from_env(ProviderKind::Anthropic);
    assert!(matches!(result, Err(ConfigError::MissingSecret { .. })));
}

#[test]
fn test_fromEnv_ollama_shouldWorkWithoutAnySecrets() {
    unsafe {
        std::env::remove_var("OLLAMA_API_KEY");
        std::env::remove_var("OLLAMA_DEFAULT_MODEL");
        std::env::remove_var("OLLAMA_BASE_URL");
    }
    let config = AdapterConfig::from_env(ProviderKind::Ollama).unwrap();
    assert!(config.api_key.is_empty());
    assert_eq!(config.model, "llama2");
    assert_eq!(config.endpoint(), "http://localhost:11434");
}

#[test]
fn test_factory_explicitConfig_shouldAlwaysBuildFreshInstances() {
    let factory = AdapterFactory::new();
    let config = AdapterConfig::new(ProviderKind::OpenAI, "per-tenant-key");

    let first = factory
        .adapter(ProviderKind::OpenAI, Some(config.clone()))
        .unwrap();
    let second = factory.adapter(ProviderKind::OpenAI, Some(config)).unwrap();

    // Distinct instances, and nothing lands in the registry
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(factory.cached_providers().is_empty());
}

#[test]
fn test_factory_registryLifecycle_shouldBeExplicit() {
    let factory = AdapterFactory::new();
    factory.insert(Arc::new(MockProvider::working()));
    assert_eq!(factory.cached_providers(), vec![ProviderKind::OpenAI]);

    let cached = factory.adapter(ProviderKind::OpenAI, None).unwrap();
    assert_eq!(cached.model(), "mock-model");

    assert!(factory.remove(ProviderKind::OpenAI));
    assert!(factory.cached_providers().is_empty());
}

#[tokio::test]
async fn test_mockProvider_validateApiKey_shouldReflectBehavior() {
    assert!(MockProvider::working().validate_api_key().await.is_ok());
    assert!(MockProvider::failing().validate_api_key().await.is_err());
}
