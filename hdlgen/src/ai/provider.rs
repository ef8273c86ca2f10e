//! AI provider abstraction.
//!
//! One capability trait implemented by interchangeable chat-completion
//! backends (Azure OpenAI, OpenAI, Gemini). Backends are selected through
//! the registry, never referenced directly by the pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// System prompt steering the model toward compilable, standards-clean HDL.
pub const SYSTEM_PROMPT: &str = "You are a hardware design assistant. Generate VHDL or Verilog code \
for the given circuit description. When generating VHDL, use the \
IEEE.NUMERIC_STD.ALL library for arithmetic operations and avoid \
using the non-standard IEEE.STD_LOGIC_UNSIGNED or IEEE.STD_LOGIC_ARITH \
libraries. Always include proper entity/module declarations and \
architecture/implementation blocks. Ensure the code is syntactically \
correct and follows best practices.";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Failed to parse response: {0}")]
    ParseError(String),
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Unsupported provider type '{requested}'. Available providers: {available}")]
    UnsupportedProvider { requested: String, available: String },
}

/// Token accounting reported by a backend, when available.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: Option<u32>,
    #[serde(default)]
    pub completion_tokens: Option<u32>,
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

/// Standardized response from any backend.
#[derive(Debug, Clone)]
pub struct AiResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

/// Per-request sampling parameters; `None` fields fall back to the
/// provider's configured defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub top_p: Option<f32>,
}

/// Caller-supplied backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider_type: String,
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub deployment_name: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

/// Result of a connectivity probe. Always a value, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub success: bool,
    pub message: String,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
}

/// Static description of a backend for discovery listings and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub name: &'static str,
    pub provider_type: &'static str,
    pub description: &'static str,
    pub supported_models: Vec<&'static str>,
    pub required_config: Vec<&'static str>,
    pub optional_config: Vec<&'static str>,
}

/// Common trait for all AI backends.
#[async_trait]
pub trait AiProvider: Send + Sync + std::fmt::Debug {
    /// Short registry key, e.g. "azure_openai".
    fn name(&self) -> &str;

    /// Static provider description.
    fn provider_info(&self) -> ProviderInfo;

    /// Check the configuration; errors name the missing/malformed field.
    fn validate_config(&self) -> Result<(), ProviderError>;

    /// Generate HDL code from a natural-language prompt.
    async fn generate_code(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<AiResponse, ProviderError>;

    /// Probe the backend with a tiny generation request. Never errors.
    async fn test_connection(&self) -> ConnectionStatus {
        if let Err(e) = self.validate_config() {
            return ConnectionStatus {
                success: false,
                message: format!("Connection failed: {e}"),
                provider: self.name().to_string(),
                model: None,
                response_time: None,
            };
        }

        let params = GenerationParams {
            max_tokens: Some(100),
            ..GenerationParams::default()
        };
        let started = std::time::Instant::now();
        match self
            .generate_code("Generate a simple AND gate in VHDL", &params)
            .await
        {
            Ok(response) => ConnectionStatus {
                success: true,
                message: "Connection successful".to_string(),
                provider: self.name().to_string(),
                model: Some(response.model),
                response_time: Some(started.elapsed().as_secs_f64()),
            },
            Err(e) => ConnectionStatus {
                success: false,
                message: format!("Connection failed: {e}"),
                provider: self.name().to_string(),
                model: None,
                response_time: None,
            },
        }
    }
}
