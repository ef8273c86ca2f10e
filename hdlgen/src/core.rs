//! Pipeline orchestration.
//!
//! [`HdlPipeline`] wires the stages together: validate the request, call
//! the selected AI backend, turn its free-form answer into normalized HDL,
//! compile it with the external toolchain, and package everything into an
//! archive. Compilation failure is data, not an error; only stages before
//! it (validation, provider I/O, extraction) can abort the run.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use crate::ai::{AiResponse, GenerationParams, ProviderConfig, ProviderError, ProviderRegistry};
use crate::compile::{CompilationResult, Compiler};
use crate::config::AppConfig;
use crate::export::{ExportError, Exporter, ProjectExport};
use crate::hdl::{
    compute_metadata, extract_code_and_language, extract_entity_name, normalize, rename_entity,
    validate_syntax, ParsedHdl, SyntaxError,
};
use crate::validate::{
    sanitize_circuit_name, validate_circuit_name, validate_generation_params, validate_prompt,
    ValidationError,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub circuit_name: String,
    pub provider: ProviderConfig,
    pub params: GenerationParams,
}

/// Everything one run produced.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub session_id: String,
    pub parsed: ParsedHdl,
    pub compilation: CompilationResult,
    pub export: ProjectExport,
    pub provider: String,
    pub model: String,
}

/// The full prompt-to-archive pipeline.
pub struct HdlPipeline {
    registry: ProviderRegistry,
    compiler: Compiler,
    exporter: Exporter,
    work_directory: PathBuf,
}

impl HdlPipeline {
    pub fn new(config: AppConfig) -> Self {
        Self {
            registry: ProviderRegistry::with_default_providers(),
            compiler: Compiler::new(config.compiler.clone()),
            exporter: Exporter::new(config.export),
            work_directory: config.compiler.work_directory,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Run the full pipeline for one request.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, PipelineError> {
        validate_prompt(&request.prompt)?;
        validate_circuit_name(&request.circuit_name)?;
        validate_generation_params(&request.params)?;

        let session_id = Uuid::new_v4().to_string();
        tracing::info!(
            session = %session_id,
            circuit = %request.circuit_name,
            provider = %request.provider.provider_type,
            "starting generation"
        );

        let provider = self.registry.create(&request.provider)?;
        provider.validate_config()?;
        let response = provider
            .generate_code(&request.prompt, &request.params)
            .await?;
        tracing::debug!(
            model = %response.model,
            chars = response.content.len(),
            "received AI response"
        );

        let parsed = parse_hdl(&response.content, &request.circuit_name)?;
        self.finish(parsed, &response, &request.circuit_name, &session_id)
            .await
    }

    /// Compile and package HDL that is already in hand, bypassing the AI
    /// stage. Used by the package command and by tests.
    pub async fn process_source(
        &self,
        raw_text: &str,
        circuit_name: &str,
    ) -> Result<GenerationOutcome, PipelineError> {
        validate_circuit_name(circuit_name)?;
        let session_id = Uuid::new_v4().to_string();
        let parsed = parse_hdl(raw_text, circuit_name)?;
        let response = AiResponse {
            content: String::new(),
            provider: "local".to_string(),
            model: "none".to_string(),
            usage: None,
        };
        self.finish(parsed, &response, circuit_name, &session_id)
            .await
    }

    async fn finish(
        &self,
        parsed: ParsedHdl,
        response: &AiResponse,
        circuit_name: &str,
        session_id: &str,
    ) -> Result<GenerationOutcome, PipelineError> {
        let compilation = self.compiler.compile(&parsed, session_id).await;
        let project_name = sanitize_circuit_name(circuit_name);
        let export = self
            .exporter
            .export_project(&parsed, &compilation, &project_name)?;

        self.cleanup_session(session_id)?;

        Ok(GenerationOutcome {
            session_id: session_id.to_string(),
            parsed,
            compilation,
            export,
            provider: response.provider.clone(),
            model: response.model.clone(),
        })
    }

    /// Remove the session's build directory (when cleanup is enabled).
    pub fn cleanup_session(&self, session_id: &str) -> Result<(), PipelineError> {
        let session_dir = self.work_directory.join(session_id);
        self.exporter.cleanup_session(&session_dir)?;
        Ok(())
    }
}

/// Turn free-form AI text into validated, renamed HDL with metadata.
///
/// Total over the text itself: extraction always yields something. The
/// result can still fail the well-formedness gate, which is the error
/// surfaced here.
pub fn parse_hdl(raw_text: &str, circuit_name: &str) -> Result<ParsedHdl, PipelineError> {
    let (language, code) = extract_code_and_language(raw_text);
    let code = normalize(&code);
    validate_syntax(&code, language)?;

    let target = sanitize_circuit_name(circuit_name);
    // The gate above guarantees a declaration exists, so the fallback arm
    // is unreachable in practice.
    let declared = extract_entity_name(&code, language).unwrap_or_else(|| target.clone());
    let content = rename_entity(&code, &declared, &target, language);
    let metadata = compute_metadata(&content, language);

    Ok(ParsedHdl {
        content,
        language,
        entity_name: target,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdl::Language;

    const AI_REPLY: &str = "Here is the design you asked for:\n\n```vhdl\nentity and_gate is\n  port (a, b : in bit; y : out bit);\nend and_gate;\n\narchitecture rtl of and_gate is\nbegin\n  y <= a and b;\nend rtl;\n```\n\nLet me know if you need a testbench.";

    #[test]
    fn test_parse_hdl_renames_to_requested_name() {
        let parsed = parse_hdl(AI_REPLY, "my_gate").unwrap();
        assert_eq!(parsed.language, Language::Vhdl);
        assert_eq!(parsed.entity_name, "my_gate");
        assert!(parsed.content.contains("entity my_gate is"));
        assert!(parsed.content.contains("architecture rtl of my_gate is"));
        assert_eq!(parsed.file_name(), "my_gate.vhdl");
    }

    #[test]
    fn test_parse_hdl_sanitizes_the_name() {
        let parsed = parse_hdl(AI_REPLY, "My Gate!").unwrap();
        assert_eq!(parsed.entity_name, "My_Gate");
    }

    #[test]
    fn test_parse_hdl_rejects_prose_only_reply() {
        let err = parse_hdl("Sorry, I cannot help with that.", "gate").unwrap_err();
        assert!(matches!(err, PipelineError::Syntax(_)));
    }

    #[test]
    fn test_parse_hdl_verilog_keyword_fallback() {
        let raw = "module blinker(input clk, output led);\nendmodule";
        let parsed = parse_hdl(raw, "blinker").unwrap();
        assert_eq!(parsed.language, Language::Verilog);
        assert_eq!(parsed.file_name(), "blinker.v");
    }
}
