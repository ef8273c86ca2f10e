//! Project packaging.
//!
//! Bundles the generated source, any compiler artifacts, a JSON manifest,
//! and a human-readable README into a single `.pdsprj` ZIP archive. The
//! archive is produced whether or not compilation succeeded, so a failed
//! build still ships with its source and diagnostics.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::compile::CompilationResult;
use crate::config::ExportConfig;
use crate::hdl::{HdlMetadata, ParsedHdl};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Failed to serialize manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Manifest embedded in the archive as `project_info.json`.
#[derive(Debug, Serialize)]
struct ProjectManifest<'a> {
    project_name: &'a str,
    hdl_language: &'a str,
    generated_by: &'static str,
    compilation_success: bool,
    metadata: &'a HdlMetadata,
}

/// Result of a packaging run.
#[derive(Debug, Clone)]
pub struct ProjectExport {
    pub archive_path: PathBuf,
    pub project_name: String,
    pub compilation_success: bool,
    /// Archive member names, in the order they were written.
    pub members: Vec<String>,
    /// Size of the finished archive in bytes.
    pub file_size: u64,
    pub export_time: Duration,
}

/// Writes `.pdsprj` archives into the configured export directory.
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Package `hdl` plus the compilation outcome into `<project_name>.pdsprj`.
    pub fn export_project(
        &self,
        hdl: &ParsedHdl,
        compilation: &CompilationResult,
        project_name: &str,
    ) -> Result<ProjectExport, ExportError> {
        let started = Instant::now();
        std::fs::create_dir_all(&self.config.export_directory)?;
        let archive_path = self
            .config
            .export_directory
            .join(format!("{project_name}.pdsprj"));

        tracing::info!(path = %archive_path.display(), "writing project archive");

        let file = File::create(&archive_path)?;
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut members = Vec::new();

        // Source comes from memory, not the build directory, so it is
        // present even when compilation never got as far as writing it.
        let source_name = hdl.file_name();
        zip.start_file(&source_name, options)?;
        zip.write_all(hdl.content.as_bytes())?;
        members.push(source_name.clone());

        for artifact in &compilation.build_files {
            let Some(name) = artifact.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name == source_name {
                continue;
            }
            let bytes = std::fs::read(artifact)?;
            zip.start_file(name, options)?;
            zip.write_all(&bytes)?;
            members.push(name.to_string());
        }

        let manifest = ProjectManifest {
            project_name,
            hdl_language: hdl.language.as_str(),
            generated_by: "hdlgen",
            compilation_success: compilation.success,
            metadata: &hdl.metadata,
        };
        zip.start_file("project_info.json", options)?;
        zip.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;
        members.push("project_info.json".to_string());

        zip.start_file("README.txt", options)?;
        zip.write_all(build_readme(hdl, compilation, project_name).as_bytes())?;
        members.push("README.txt".to_string());

        zip.finish()?;
        let file_size = std::fs::metadata(&archive_path)?.len();

        Ok(ProjectExport {
            archive_path,
            project_name: project_name.to_string(),
            compilation_success: compilation.success,
            members,
            file_size,
            export_time: started.elapsed(),
        })
    }

    /// Remove a session's temp directory if cleanup is enabled.
    pub fn cleanup_session(&self, session_dir: &Path) -> Result<(), ExportError> {
        if !self.config.cleanup_temp_files {
            return Ok(());
        }
        if session_dir.is_dir() {
            std::fs::remove_dir_all(session_dir)?;
            tracing::debug!(path = %session_dir.display(), "removed session directory");
        }
        Ok(())
    }
}

fn build_readme(hdl: &ParsedHdl, compilation: &CompilationResult, project_name: &str) -> String {
    let mut readme = String::new();
    readme.push_str(&format!("Project: {project_name}\n"));
    readme.push_str(&format!("Language: {}\n", hdl.language.as_str().to_uppercase()));
    readme.push_str(&format!("Top-level unit: {}\n", hdl.entity_name));
    readme.push_str(&format!(
        "Compilation: {}\n",
        if compilation.success {
            "SUCCESS"
        } else {
            "FAILED"
        }
    ));
    readme.push('\n');

    if let Some(error) = &compilation.error_message {
        readme.push_str("Compilation errors:\n");
        readme.push_str(error);
        if !error.ends_with('\n') {
            readme.push('\n');
        }
        readme.push('\n');
    }
    if !compilation.warnings.is_empty() {
        readme.push_str("Compilation warnings:\n");
        for warning in &compilation.warnings {
            readme.push_str(warning);
            if !warning.ends_with('\n') {
                readme.push('\n');
            }
        }
        readme.push('\n');
    }

    readme.push_str("Code statistics:\n");
    readme.push_str(&format!("  Lines of code: {}\n", hdl.metadata.lines_of_code));
    readme.push_str(&format!("  Signals: {}\n", hdl.metadata.signals_count));
    readme.push_str(&format!("  Processes: {}\n", hdl.metadata.processes_count));
    readme.push_str(&format!(
        "  Contains testbench: {}\n",
        if hdl.metadata.has_testbench { "Yes" } else { "No" }
    ));
    if !hdl.metadata.libraries_used.is_empty() {
        readme.push_str(&format!(
            "  Libraries: {}\n",
            hdl.metadata.libraries_used.join(", ")
        ));
    }
    readme.push('\n');

    readme.push_str("Contents:\n");
    readme.push_str(&format!("  {} - HDL source\n", hdl.file_name()));
    readme.push_str("  project_info.json - project metadata\n");
    readme.push('\n');
    readme.push_str("Open this archive with a ZIP tool to inspect the files, or import\n");
    readme.push_str("the HDL source into your simulator of choice. Re-run compilation\n");
    readme.push_str("locally with GHDL (VHDL) or Icarus Verilog (Verilog) after fixing\n");
    readme.push_str("any reported errors.\n");
    readme
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdl::{compute_metadata, Language};
    use std::time::Duration;

    fn sample_hdl() -> ParsedHdl {
        let content = "entity and_gate is\nend and_gate;\narchitecture rtl of and_gate is\nbegin\nend rtl;\n";
        ParsedHdl {
            content: content.to_string(),
            language: Language::Vhdl,
            entity_name: "and_gate".to_string(),
            metadata: compute_metadata(content, Language::Vhdl),
        }
    }

    fn failed_compilation() -> CompilationResult {
        CompilationResult {
            success: false,
            entity_name: "and_gate".to_string(),
            language: Language::Vhdl,
            build_files: vec![],
            error_message: Some("and_gate.vhdl:3: parse error".to_string()),
            warnings: vec![],
            compilation_time: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_readme_mentions_failure_and_errors() {
        let readme = build_readme(&sample_hdl(), &failed_compilation(), "and_gate");
        assert!(readme.contains("Compilation: FAILED"));
        assert!(readme.contains("parse error"));
        assert!(readme.contains("and_gate.vhdl"));
    }

    #[test]
    fn test_readme_reports_testbench_presence() {
        let readme = build_readme(&sample_hdl(), &failed_compilation(), "and_gate");
        assert!(readme.contains("Contains testbench: No"));

        let content = "entity tb_and_gate is\nend tb_and_gate;\narchitecture sim of tb_and_gate is\nbegin\nend sim;\n";
        let tb = ParsedHdl {
            content: content.to_string(),
            language: Language::Vhdl,
            entity_name: "tb_and_gate".to_string(),
            metadata: compute_metadata(content, Language::Vhdl),
        };
        let readme = build_readme(&tb, &failed_compilation(), "tb_and_gate");
        assert!(readme.contains("Contains testbench: Yes"));
    }

    #[test]
    fn test_readme_success_has_no_error_section() {
        let mut compilation = failed_compilation();
        compilation.success = true;
        compilation.error_message = None;
        let readme = build_readme(&sample_hdl(), &compilation, "and_gate");
        assert!(readme.contains("Compilation: SUCCESS"));
        assert!(!readme.contains("Compilation errors"));
    }
}
