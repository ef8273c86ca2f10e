pub mod azure;
mod chat;
pub mod gemini;
pub mod openai;
pub mod provider;
pub mod registry;

// Re-export for convenience
pub use azure::AzureOpenAiProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use provider::{
    AiProvider, AiResponse, ConnectionStatus, GenerationParams, ProviderConfig, ProviderError,
    ProviderInfo, TokenUsage, SYSTEM_PROMPT,
};
pub use registry::ProviderRegistry;
