//! Provider registry.
//!
//! Maps a string key (with aliases) to a backend constructor, so the
//! pipeline can stay ignorant of concrete provider types.

use std::collections::HashMap;
use std::sync::Arc;

use super::azure::AzureOpenAiProvider;
use super::gemini::GeminiProvider;
use super::openai::OpenAiProvider;
use super::provider::{
    AiProvider, ConnectionStatus, ProviderConfig, ProviderError, ProviderInfo,
};

type ProviderBuilder = fn(ProviderConfig) -> Arc<dyn AiProvider>;

/// Registry of available AI backends.
pub struct ProviderRegistry {
    builders: HashMap<&'static str, ProviderBuilder>,
}

impl ProviderRegistry {
    /// Empty registry; mostly useful in tests.
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Registry with all built-in backends and their aliases.
    pub fn with_default_providers() -> Self {
        let mut registry = Self::new();
        registry.register("azure_openai", |c| Arc::new(AzureOpenAiProvider::new(c)));
        registry.register("azure", |c| Arc::new(AzureOpenAiProvider::new(c)));
        registry.register("openai", |c| Arc::new(OpenAiProvider::new(c)));
        registry.register("gpt", |c| Arc::new(OpenAiProvider::new(c)));
        registry.register("gemini", |c| Arc::new(GeminiProvider::new(c)));
        registry.register("google_gemini", |c| Arc::new(GeminiProvider::new(c)));
        registry
    }

    pub fn register(&mut self, key: &'static str, builder: ProviderBuilder) {
        self.builders.insert(key, builder);
    }

    pub fn is_supported(&self, provider_type: &str) -> bool {
        self.builders
            .contains_key(provider_type.trim().to_lowercase().as_str())
    }

    /// Sorted list of registry keys, aliases included.
    pub fn available_providers(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.builders.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Build a provider for the config's `provider_type`.
    pub fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn AiProvider>, ProviderError> {
        let key = config.provider_type.trim().to_lowercase();
        let builder =
            self.builders
                .get(key.as_str())
                .ok_or_else(|| ProviderError::UnsupportedProvider {
                    requested: config.provider_type.clone(),
                    available: self.available_providers().join(", "),
                })?;
        Ok(builder(config.clone()))
    }

    /// Static descriptions of the distinct backends (aliases collapsed).
    pub fn provider_infos(&self, config_template: &ProviderConfig) -> Vec<ProviderInfo> {
        let mut infos: Vec<ProviderInfo> = Vec::new();
        for key in self.available_providers() {
            let mut config = config_template.clone();
            config.provider_type = key.to_string();
            if let Ok(provider) = self.create(&config) {
                let info = provider.provider_info();
                if !infos.iter().any(|i| i.provider_type == info.provider_type) {
                    infos.push(info);
                }
            }
        }
        infos
    }

    /// Validate a configuration by constructing the backend and asking it.
    pub fn validate_config(&self, config: &ProviderConfig) -> Result<(), ProviderError> {
        self.create(config)?.validate_config()
    }

    /// Probe connectivity; construction failures become a status value too.
    pub async fn test_connection(&self, config: &ProviderConfig) -> ConnectionStatus {
        match self.create(config) {
            Ok(provider) => provider.test_connection().await,
            Err(e) => ConnectionStatus {
                success: false,
                message: format!("Failed to test connection: {e}"),
                provider: config.provider_type.clone(),
                model: None,
                response_time: None,
            },
        }
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_default_providers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider_type: &str) -> ProviderConfig {
        ProviderConfig {
            provider_type: provider_type.to_string(),
            api_key: "test-key".to_string(),
            model_name: Some("gpt-4o".to_string()),
            endpoint: None,
            api_version: None,
            deployment_name: None,
            temperature: 0.7,
            max_tokens: 2000,
        }
    }

    #[test]
    fn test_unknown_provider_lists_available() {
        let registry = ProviderRegistry::with_default_providers();
        let err = registry.create(&config("claude")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("claude"));
        assert!(message.contains("azure_openai"));
        assert!(message.contains("gemini"));
    }

    #[test]
    fn test_aliases_resolve_to_same_backend() {
        let registry = ProviderRegistry::with_default_providers();
        let a = registry.create(&config("azure")).unwrap();
        let b = registry.create(&config("azure_openai")).unwrap();
        assert_eq!(a.name(), b.name());

        let c = registry.create(&config("gpt")).unwrap();
        assert_eq!(c.name(), "openai");
    }

    #[test]
    fn test_key_is_trimmed_and_lowercased() {
        let registry = ProviderRegistry::with_default_providers();
        assert!(registry.is_supported("  Azure_OpenAI "));
        assert!(registry.create(&config(" GEMINI ")).is_ok());
    }

    #[test]
    fn test_infos_collapse_aliases() {
        let registry = ProviderRegistry::with_default_providers();
        let infos = registry.provider_infos(&config("openai"));
        assert_eq!(infos.len(), 3);
    }

    #[tokio::test]
    async fn test_connection_failure_is_a_status() {
        let registry = ProviderRegistry::with_default_providers();
        let status = registry.test_connection(&config("no_such_backend")).await;
        assert!(!status.success);
        assert!(status.message.contains("no_such_backend"));
    }
}
