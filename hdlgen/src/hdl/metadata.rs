//! Structural statistics over normalized HDL source.
//!
//! All counts are keyword-level heuristics for observability and the export
//! manifest; nothing downstream branches on them.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Language;

/// Structural stats embedded in the export manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HdlMetadata {
    pub lines_of_code: usize,
    pub has_testbench: bool,
    pub libraries_used: Vec<String>,
    pub signals_count: usize,
    pub processes_count: usize,
}

static VHDL_SIGNAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsignal\s+\w+").expect("signal pattern is valid"));
static VHDL_PROCESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bprocess\b").expect("process pattern is valid"));
static VHDL_LIBRARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blibrary\s+(\w+)").expect("library pattern is valid"));
static VHDL_USE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\buse\s+([\w.]+)").expect("use pattern is valid"));
static VERILOG_WIRE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bwire\s+").expect("wire pattern is valid"));
static VERILOG_REG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\breg\s+").expect("reg pattern is valid"));
static VERILOG_ALWAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\balways\b").expect("always pattern is valid"));
static VERILOG_INCLUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("`include\\s+\"([^\"]+)\"").expect("include pattern is valid"));

/// Compute structural metadata for a piece of HDL source.
pub fn compute_metadata(code: &str, language: Language) -> HdlMetadata {
    HdlMetadata {
        lines_of_code: code.lines().count(),
        has_testbench: detect_testbench(code, language),
        libraries_used: extract_libraries(code, language),
        signals_count: count_signals(code, language),
        processes_count: count_processes(code, language),
    }
}

fn detect_testbench(code: &str, language: Language) -> bool {
    let lower = code.to_lowercase();
    let markers: &[&str] = match language {
        Language::Vhdl => &["testbench", "tb_", "_tb", "test_"],
        Language::Verilog => &["testbench", "tb_", "_tb", "initial", "$monitor"],
    };
    markers.iter().any(|m| lower.contains(m))
}

fn extract_libraries(code: &str, language: Language) -> Vec<String> {
    // BTreeSet both deduplicates and keeps the manifest deterministic.
    let mut libraries = BTreeSet::new();
    match language {
        Language::Vhdl => {
            for caps in VHDL_LIBRARY.captures_iter(code) {
                libraries.insert(caps[1].to_string());
            }
            for caps in VHDL_USE.captures_iter(code) {
                let full = &caps[1];
                let root = full.split('.').next().unwrap_or(full);
                libraries.insert(root.to_string());
            }
        }
        Language::Verilog => {
            for caps in VERILOG_INCLUDE.captures_iter(code) {
                libraries.insert(caps[1].to_string());
            }
        }
    }
    libraries.into_iter().collect()
}

fn count_signals(code: &str, language: Language) -> usize {
    match language {
        Language::Vhdl => VHDL_SIGNAL.find_iter(code).count(),
        Language::Verilog => {
            VERILOG_WIRE.find_iter(code).count() + VERILOG_REG.find_iter(code).count()
        }
    }
}

fn count_processes(code: &str, language: Language) -> usize {
    match language {
        Language::Vhdl => VHDL_PROCESS.find_iter(code).count(),
        Language::Verilog => VERILOG_ALWAYS.find_iter(code).count(),
    }
}
