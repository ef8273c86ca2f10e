//! OpenAI backend (standard `/v1/chat/completions` with Bearer auth).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::chat::{build_messages, ChatRequest, ChatResponse};
use super::provider::{
    AiProvider, AiResponse, GenerationParams, ProviderConfig, ProviderError, ProviderInfo,
};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug)]
pub struct OpenAiProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    fn url(&self) -> &str {
        // An explicit endpoint overrides the public API (proxies, gateways).
        self.config.endpoint.as_deref().unwrap_or(DEFAULT_API_URL)
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "OpenAI",
            provider_type: "openai",
            description: "OpenAI chat-completions provider for HDL code generation",
            supported_models: vec!["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-3.5-turbo"],
            required_config: vec!["api_key", "model_name"],
            optional_config: vec!["endpoint", "temperature", "max_tokens"],
        }
    }

    fn validate_config(&self) -> Result<(), ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::MissingConfig("api_key".to_string()));
        }
        if !self.config.api_key.starts_with("sk-") {
            return Err(ProviderError::InvalidConfig(
                "OpenAI API key should start with sk-".to_string(),
            ));
        }
        if self.config.model_name.as_deref().unwrap_or("").is_empty() {
            return Err(ProviderError::MissingConfig("model_name".to_string()));
        }
        Ok(())
    }

    async fn generate_code(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<AiResponse, ProviderError> {
        self.validate_config()?;

        let model = self.config.model_name.clone().unwrap_or_default();
        let request = ChatRequest {
            model: Some(model.clone()),
            messages: build_messages(prompt),
            temperature: params.temperature.unwrap_or(self.config.temperature),
            max_tokens: params.max_tokens.unwrap_or(self.config.max_tokens),
            top_p: params.top_p,
        };

        tracing::debug!(model = %model, "sending OpenAI request");

        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.config.api_key)
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
            provider: "openai".to_string(),
            model,
            usage: chat.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: &str, model: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            provider_type: "openai".to_string(),
            api_key: api_key.to_string(),
            model_name: model.map(String::from),
            endpoint: None,
            api_version: None,
            deployment_name: None,
            temperature: 0.7,
            max_tokens: 2000,
        }
    }

    #[test]
    fn test_validate_key_prefix() {
        let provider = OpenAiProvider::new(config("bad-key", Some("gpt-4o")));
        let err = provider.validate_config().unwrap_err();
        assert!(err.to_string().contains("sk-"));

        let provider = OpenAiProvider::new(config("sk-abc123", Some("gpt-4o")));
        assert!(provider.validate_config().is_ok());
    }

    #[test]
    fn test_validate_requires_model() {
        let provider = OpenAiProvider::new(config("sk-abc123", None));
        let err = provider.validate_config().unwrap_err();
        assert!(err.to_string().contains("model_name"));
    }

    #[test]
    fn test_endpoint_override() {
        let mut cfg = config("sk-abc123", Some("gpt-4o"));
        cfg.endpoint = Some("https://gateway.local/v1/chat/completions".to_string());
        let provider = OpenAiProvider::new(cfg);
        assert_eq!(provider.url(), "https://gateway.local/v1/chat/completions");
    }
}
