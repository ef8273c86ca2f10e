//! Google Gemini backend (`models/{model}:generateContent`).
//!
//! Uses its own wire schema rather than the chat-completions one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::provider::{
    AiProvider, AiResponse, GenerationParams, ProviderConfig, ProviderError, ProviderInfo,
    TokenUsage, SYSTEM_PROMPT,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug)]
pub struct GeminiProvider {
    client: Client,
    config: ProviderConfig,
    model: String,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "topP", skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: Option<u32>,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: Option<u32>,
    #[serde(rename = "totalTokenCount", default)]
    total_token_count: Option<u32>,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        let model = config
            .model_name
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self {
            client,
            config,
            model,
        }
    }

    fn url(&self) -> String {
        let base = self.config.endpoint.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let base = base.trim_end_matches('/');
        format!("{}/models/{}:generateContent", base, self.model)
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Google Gemini",
            provider_type: "gemini",
            description: "Google Gemini provider for HDL code generation",
            supported_models: vec!["gemini-1.5-flash", "gemini-1.5-pro", "gemini-2.0-flash"],
            required_config: vec!["api_key", "model_name"],
            optional_config: vec!["endpoint", "temperature", "max_tokens"],
        }
    }

    fn validate_config(&self) -> Result<(), ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::MissingConfig("api_key".to_string()));
        }
        if !self.model.starts_with("gemini-") {
            return Err(ProviderError::InvalidConfig(
                "Gemini model name should start with gemini-".to_string(),
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

        let request = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: SYSTEM_PROMPT.to_string(),
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: params.temperature.unwrap_or(self.config.temperature),
                max_output_tokens: params.max_tokens.unwrap_or(self.config.max_tokens),
                top_p: params.top_p,
            },
        };

        tracing::debug!(model = %self.model, "sending Gemini request");

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.config.api_key)
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

        let gemini: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse JSON: {e}")))?;

        let content = gemini
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| {
                ProviderError::InvalidResponse("Empty candidates array in response".to_string())
            })?;

        let usage = gemini.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(AiResponse {
            content,
            provider: "gemini".to_string(),
            model: self.model.clone(),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: &str, model: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            provider_type: "gemini".to_string(),
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
    fn test_validate_model_prefix() {
        let provider = GeminiProvider::new(config("key", Some("llama3")));
        assert!(provider.validate_config().is_err());

        let provider = GeminiProvider::new(config("key", Some("gemini-1.5-pro")));
        assert!(provider.validate_config().is_ok());
    }

    #[test]
    fn test_default_model_and_url() {
        let provider = GeminiProvider::new(config("key", None));
        assert_eq!(provider.model, DEFAULT_MODEL);
        assert!(provider.url().ends_with("models/gemini-1.5-flash:generateContent"));
    }
}
