//! Pulls a single HDL source block and its language out of free-form AI text.
//!
//! Extraction is a total function: when no fenced block and no indicative
//! keyword is found, the whole input is classified as VHDL and handed to the
//! syntax gate, which owns the rejection diagnostic.

use std::sync::LazyLock;

use regex::Regex;

use super::Language;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?si)```(vhdl|verilog|systemverilog)\s*\n(.*?)\n```")
        .expect("fenced block pattern is valid")
});

const VHDL_KEYWORDS: &[&str] = &["entity", "architecture", "library ieee"];
const VERILOG_KEYWORDS: &[&str] = &["module", "endmodule", "always", "wire"];

/// Extract HDL code and its language from an AI response.
///
/// Priority order: first fenced block tagged `vhdl`/`verilog`/`systemverilog`
/// (case-insensitive), then keyword-based classification of the whole text,
/// then a VHDL default.
pub fn extract_code_and_language(content: &str) -> (Language, String) {
    if let Some(caps) = FENCED_BLOCK.captures(content) {
        let tag = caps[1].to_lowercase();
        let code = caps[2].trim().to_string();
        let language = match tag.as_str() {
            "verilog" | "systemverilog" => Language::Verilog,
            _ => Language::Vhdl,
        };
        return (language, code);
    }

    let lower = content.to_lowercase();
    if VHDL_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return (Language::Vhdl, content.trim().to_string());
    }
    if VERILOG_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return (Language::Verilog, content.trim().to_string());
    }

    (Language::Vhdl, content.trim().to_string())
}
