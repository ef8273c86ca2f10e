//! Compilation orchestration for the external toolchains.
//!
//! VHDL goes through GHDL's two stages (analyze, then elaborate); Verilog
//! through a single Icarus Verilog invocation. Every stage runs under a
//! wall-clock timeout, and every failure (spawn error, non-zero exit,
//! timeout) is captured as a [`CompilationResult`] value. Nothing escapes
//! this module as an error, so export can always proceed.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::process::Command;

use crate::config::CompilerConfig;
use crate::hdl::{Language, ParsedHdl};

/// Outcome of a compilation run. A failed result is a first-class value.
#[derive(Debug, Clone)]
pub struct CompilationResult {
    pub success: bool,
    pub entity_name: String,
    pub language: Language,
    /// Every regular file left in the build directory, sorted by name.
    pub build_files: Vec<PathBuf>,
    pub error_message: Option<String>,
    pub warnings: Vec<String>,
    pub compilation_time: Duration,
}

impl CompilationResult {
    fn failure(entity_name: &str, language: Language, message: String) -> Self {
        Self {
            success: false,
            entity_name: entity_name.to_string(),
            language,
            build_files: vec![],
            error_message: Some(message),
            warnings: vec![],
            compilation_time: Duration::ZERO,
        }
    }
}

enum StageOutcome {
    Completed(std::process::Output),
    TimedOut,
}

/// Drives GHDL and Icarus Verilog over per-session build directories.
pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Per-session build directory (`<work_directory>/<session_id>`).
    pub fn build_dir(&self, session_id: &str) -> PathBuf {
        self.config.work_directory.join(session_id)
    }

    /// Compile `hdl` inside the session's build directory.
    ///
    /// Infallible at this boundary: internal errors become a failed result.
    pub async fn compile(&self, hdl: &ParsedHdl, session_id: &str) -> CompilationResult {
        let started = Instant::now();
        tracing::info!(
            entity = %hdl.entity_name,
            language = %hdl.language,
            "starting compilation"
        );

        let mut result = match self.compile_inner(hdl, session_id).await {
            Ok(result) => result,
            Err(e) => CompilationResult::failure(&hdl.entity_name, hdl.language, e.to_string()),
        };
        result.compilation_time = started.elapsed();

        if result.success {
            tracing::info!(
                elapsed_ms = result.compilation_time.as_millis() as u64,
                "compilation successful"
            );
        } else {
            tracing::warn!(
                error = result.error_message.as_deref().unwrap_or("unknown"),
                "compilation failed"
            );
        }
        result
    }

    async fn compile_inner(
        &self,
        hdl: &ParsedHdl,
        session_id: &str,
    ) -> std::io::Result<CompilationResult> {
        let build_dir = self.build_dir(session_id);
        std::fs::create_dir_all(&build_dir)?;

        let hdl_file = build_dir.join(hdl.file_name());
        std::fs::write(&hdl_file, &hdl.content)?;

        match hdl.language {
            Language::Vhdl => self.compile_vhdl(&hdl.entity_name, &hdl_file, &build_dir).await,
            Language::Verilog => {
                self.compile_verilog(&hdl.entity_name, &hdl_file, &build_dir)
                    .await
            }
        }
    }

    async fn compile_vhdl(
        &self,
        entity_name: &str,
        hdl_file: &Path,
        build_dir: &Path,
    ) -> std::io::Result<CompilationResult> {
        let mut warnings = Vec::new();

        // Stage 1: analyze
        let mut analyze = Command::new(&self.config.ghdl_path);
        analyze
            .arg("-a")
            .arg(format!("--workdir={}", build_dir.display()))
            .args(&self.config.vhdl_flags)
            .arg(hdl_file);
        match self.run_stage(analyze).await? {
            StageOutcome::TimedOut => {
                return Ok(self.timeout_failure(entity_name, Language::Vhdl));
            }
            StageOutcome::Completed(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                if !output.status.success() {
                    return Ok(CompilationResult::failure(
                        entity_name,
                        Language::Vhdl,
                        stderr,
                    ));
                }
                if !stderr.is_empty() {
                    warnings.push(stderr);
                }
            }
        }

        // Stage 2: elaborate
        let mut elaborate = Command::new(&self.config.ghdl_path);
        elaborate
            .arg("-e")
            .arg(format!("--workdir={}", build_dir.display()))
            .current_dir(build_dir)
            .arg(entity_name);
        match self.run_stage(elaborate).await? {
            StageOutcome::TimedOut => {
                return Ok(self.timeout_failure(entity_name, Language::Vhdl));
            }
            StageOutcome::Completed(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                if !output.status.success() {
                    return Ok(CompilationResult::failure(
                        entity_name,
                        Language::Vhdl,
                        stderr,
                    ));
                }
                if !stderr.is_empty() {
                    warnings.push(stderr);
                }
            }
        }

        Ok(CompilationResult {
            success: true,
            entity_name: entity_name.to_string(),
            language: Language::Vhdl,
            build_files: collect_build_files(build_dir)?,
            error_message: None,
            warnings,
            compilation_time: Duration::ZERO,
        })
    }

    async fn compile_verilog(
        &self,
        entity_name: &str,
        hdl_file: &Path,
        build_dir: &Path,
    ) -> std::io::Result<CompilationResult> {
        let mut warnings = Vec::new();
        let output_file = build_dir.join(format!("{entity_name}.out"));

        let mut compile = Command::new(&self.config.iverilog_path);
        compile
            .arg("-o")
            .arg(&output_file)
            .args(&self.config.verilog_flags)
            .arg(hdl_file);
        match self.run_stage(compile).await? {
            StageOutcome::TimedOut => {
                return Ok(self.timeout_failure(entity_name, Language::Verilog));
            }
            StageOutcome::Completed(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                if !output.status.success() {
                    return Ok(CompilationResult::failure(
                        entity_name,
                        Language::Verilog,
                        stderr,
                    ));
                }
                if !stderr.is_empty() {
                    warnings.push(stderr);
                }
            }
        }

        Ok(CompilationResult {
            success: true,
            entity_name: entity_name.to_string(),
            language: Language::Verilog,
            build_files: collect_build_files(build_dir)?,
            error_message: None,
            warnings,
            compilation_time: Duration::ZERO,
        })
    }

    async fn run_stage(&self, mut command: Command) -> std::io::Result<StageOutcome> {
        command.kill_on_drop(true);
        let timeout = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(timeout, command.output()).await {
            Ok(output) => Ok(StageOutcome::Completed(output?)),
            Err(_) => Ok(StageOutcome::TimedOut),
        }
    }

    fn timeout_failure(&self, entity_name: &str, language: Language) -> CompilationResult {
        CompilationResult::failure(
            entity_name,
            language,
            format!(
                "Compilation timeout after {} seconds",
                self.config.timeout_secs
            ),
        )
    }
}

fn collect_build_files(build_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(build_dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
