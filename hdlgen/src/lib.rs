//! hdlgen - AI-assisted HDL generation library
//!
//! Turns a natural-language circuit description into compiled, packaged
//! HDL: an AI backend writes VHDL or Verilog, the code is extracted from
//! the free-form reply, checked, renamed to the requested circuit name,
//! compiled with GHDL or Icarus Verilog, and bundled into a `.pdsprj`
//! archive together with its metadata. A failed compilation still produces
//! an archive carrying the source and the compiler diagnostics.
//!
//! # Quick Start
//!
//! ```no_run
//! use hdlgen::{AppConfig, GenerationRequest, HdlPipeline};
//! use hdlgen::ai::{GenerationParams, ProviderConfig};
//!
//! # async fn run() -> Result<(), hdlgen::PipelineError> {
//! let pipeline = HdlPipeline::new(AppConfig::default());
//! let request = GenerationRequest {
//!     prompt: "A 4-bit synchronous counter with enable".to_string(),
//!     circuit_name: "counter4".to_string(),
//!     provider: ProviderConfig {
//!         provider_type: "openai".to_string(),
//!         api_key: "sk-...".to_string(),
//!         model_name: Some("gpt-4o".to_string()),
//!         endpoint: None,
//!         api_version: None,
//!         deployment_name: None,
//!         temperature: 0.7,
//!         max_tokens: 2000,
//!     },
//!     params: GenerationParams::default(),
//! };
//! let outcome = pipeline.generate(&request).await?;
//! println!("archive: {}", outcome.export.archive_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Providers**: Azure OpenAI, OpenAI, and Gemini behind one trait
//! - **Extraction**: fenced-block parsing with keyword fallback
//! - **Compilation**: GHDL (VHDL) and Icarus Verilog, timeout-bounded
//! - **Export**: `.pdsprj` ZIP with source, artifacts, and manifest

pub mod ai;
pub mod compile;
pub mod config;
pub mod core;
pub mod export;
pub mod hdl;
pub mod validate;

// Re-export main types
pub use ai::{AiProvider, AiResponse, ConnectionStatus, ProviderConfig, ProviderRegistry};
pub use compile::{CompilationResult, Compiler};
pub use config::{AppConfig, CompilerConfig, ConfigError, ExportConfig};
pub use core::{parse_hdl, GenerationOutcome, GenerationRequest, HdlPipeline, PipelineError};
pub use export::{Exporter, ProjectExport};
pub use hdl::{HdlMetadata, Language, ParsedHdl};
pub use validate::{sanitize_circuit_name, validate_circuit_name, validate_prompt};
