//! Azure OpenAI backend.
//!
//! Talks to a deployment-scoped chat-completions endpoint:
//! `{endpoint}openai/deployments/{deployment}/chat/completions?api-version=...`

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;

use super::chat::{build_messages, ChatRequest, ChatResponse};
use super::provider::{
    AiProvider, AiResponse, GenerationParams, ProviderConfig, ProviderError, ProviderInfo,
};

const DEFAULT_DEPLOYMENT: &str = "gpt-4o";
const REQUEST_TIMEOUT_SECS: u64 = 60;

static API_VERSION_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}(-preview)?$").expect("api version pattern is valid")
});

#[derive(Debug)]
pub struct AzureOpenAiProvider {
    client: Client,
    config: ProviderConfig,
    deployment: String,
}

impl AzureOpenAiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        let deployment = config
            .deployment_name
            .clone()
            .or_else(|| config.model_name.clone())
            .unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string());
        Self {
            client,
            config,
            deployment,
        }
    }

    /// Endpoint with a guaranteed trailing slash.
    fn endpoint(&self) -> Result<String, ProviderError> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .ok_or_else(|| ProviderError::MissingConfig("endpoint".to_string()))?;
        if endpoint.ends_with('/') {
            Ok(endpoint.to_string())
        } else {
            Ok(format!("{endpoint}/"))
        }
    }
}

#[async_trait]
impl AiProvider for AzureOpenAiProvider {
    fn name(&self) -> &str {
        "azure_openai"
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Azure OpenAI",
            provider_type: "azure_openai",
            description: "Microsoft Azure OpenAI Service provider for HDL code generation",
            supported_models: vec![
                "gpt-4",
                "gpt-4-32k",
                "gpt-4o",
                "gpt-4-turbo",
                "gpt-35-turbo",
                "gpt-35-turbo-16k",
            ],
            required_config: vec!["api_key", "endpoint", "api_version"],
            optional_config: vec!["deployment_name", "temperature", "max_tokens"],
        }
    }

    fn validate_config(&self) -> Result<(), ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::MissingConfig("api_key".to_string()));
        }
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .ok_or_else(|| ProviderError::MissingConfig("endpoint".to_string()))?;
        if !endpoint.starts_with("https://") {
            return Err(ProviderError::InvalidConfig(
                "Azure endpoint must start with https://".to_string(),
            ));
        }
        let api_version = self
            .config
            .api_version
            .as_deref()
            .ok_or_else(|| ProviderError::MissingConfig("api_version".to_string()))?;
        if !API_VERSION_FORMAT.is_match(api_version) {
            return Err(ProviderError::InvalidConfig(
                "Invalid API version format (should be YYYY-MM-DD or YYYY-MM-DD-preview)"
                    .to_string(),
            ));
        }
        Ok(())
    }

    async fn generate_code(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<AiResponse, ProviderError> {
        self.validate_config()?;

        let api_version = self.config.api_version.as_deref().unwrap_or_default();
        let url = format!(
            "{}openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint()?,
            self.deployment,
            api_version
        );

        let request = ChatRequest {
            model: None, // Azure routes by deployment, not body model
            messages: build_messages(prompt),
            temperature: params.temperature.unwrap_or(self.config.temperature),
            max_tokens: params.max_tokens.unwrap_or(self.config.max_tokens),
            top_p: params.top_p,
        };

        tracing::debug!(deployment = %self.deployment, "sending Azure OpenAI request");

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse JSON: {e}")))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                ProviderError::InvalidResponse("Empty choices array in response".to_string())
            })?;

        Ok(AiResponse {
            content,
            provider: "azure_openai".to_string(),
            model: self.deployment.clone(),
            usage: chat.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: Option<&str>, api_version: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            provider_type: "azure_openai".to_string(),
            api_key: "test-key".to_string(),
            model_name: None,
            endpoint: endpoint.map(String::from),
            api_version: api_version.map(String::from),
            deployment_name: Some("gpt-4o".to_string()),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_config() {
        let provider = AzureOpenAiProvider::new(config(
            Some("https://example.openai.azure.com"),
            Some("2024-02-01"),
        ));
        assert!(provider.validate_config().is_ok());
    }

    #[test]
    fn test_validate_rejects_http_endpoint() {
        let provider = AzureOpenAiProvider::new(config(
            Some("http://example.openai.azure.com"),
            Some("2024-02-01"),
        ));
        let err = provider.validate_config().unwrap_err();
        assert!(err.to_string().contains("https://"));
    }

    #[test]
    fn test_validate_names_missing_field() {
        let provider = AzureOpenAiProvider::new(config(None, Some("2024-02-01")));
        let err = provider.validate_config().unwrap_err();
        assert!(err.to_string().contains("endpoint"));
    }

    #[test]
    fn test_validate_rejects_bad_api_version() {
        let provider = AzureOpenAiProvider::new(config(
            Some("https://example.openai.azure.com"),
            Some("v1"),
        ));
        assert!(provider.validate_config().is_err());
        let provider = AzureOpenAiProvider::new(config(
            Some("https://example.openai.azure.com"),
            Some("2024-02-01-preview"),
        ));
        assert!(provider.validate_config().is_ok());
    }

    #[test]
    fn test_endpoint_gains_trailing_slash() {
        let provider = AzureOpenAiProvider::new(config(
            Some("https://example.openai.azure.com"),
            Some("2024-02-01"),
        ));
        assert_eq!(
            provider.endpoint().unwrap(),
            "https://example.openai.azure.com/"
        );
    }
}
