//! Application configuration.
//!
//! A plain value constructed once at process start and passed by reference
//! into the pipeline. Sources, in increasing priority: built-in defaults,
//! an optional JSON file, `HDLGEN_*` environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// External toolchain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub ghdl_path: String,
    pub iverilog_path: String,
    pub work_directory: PathBuf,
    /// Wall-clock limit per compiler stage, in seconds.
    pub timeout_secs: u64,
    pub vhdl_flags: Vec<String>,
    pub verilog_flags: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            ghdl_path: "ghdl".to_string(),
            iverilog_path: "iverilog".to_string(),
            work_directory: PathBuf::from("build"),
            timeout_secs: 60,
            vhdl_flags: vec!["-fsynopsys".to_string()],
            verilog_flags: vec![],
        }
    }
}

/// Session/export directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub export_directory: PathBuf,
    pub temp_directory: PathBuf,
    pub cleanup_temp_files: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            export_directory: PathBuf::from("export"),
            temp_directory: PathBuf::from("temp"),
            cleanup_temp_files: true,
        }
    }
}

/// Top-level configuration for the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_provider: Option<String>,
    pub compiler: CompilerConfig,
    pub export: ExportConfig,
}

impl AppConfig {
    /// Load configuration from an optional JSON file plus env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)?;
                serde_json::from_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("HDLGEN_GHDL_PATH") {
            self.compiler.ghdl_path = v;
        }
        if let Ok(v) = std::env::var("HDLGEN_IVERILOG_PATH") {
            self.compiler.iverilog_path = v;
        }
        if let Ok(v) = std::env::var("HDLGEN_WORK_DIR") {
            self.compiler.work_directory = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("HDLGEN_TIMEOUT_SECS") {
            if let Ok(secs) = v.parse() {
                self.compiler.timeout_secs = secs;
            }
        }
        if let Ok(v) = std::env::var("HDLGEN_TEMP_DIR") {
            self.export.temp_directory = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("HDLGEN_EXPORT_DIR") {
            self.export.export_directory = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("HDLGEN_DEFAULT_PROVIDER") {
            self.default_provider = Some(v);
        }
    }
}
