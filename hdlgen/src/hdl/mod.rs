//! HDL source handling: extraction from AI text, normalization, top-level
//! identifier rewriting, and structural metadata.

pub mod extract;
pub mod metadata;
pub mod rewrite;

use serde::{Deserialize, Serialize};

pub use extract::extract_code_and_language;
pub use metadata::{compute_metadata, HdlMetadata};
pub use rewrite::{extract_entity_name, normalize, rename_entity, validate_syntax, SyntaxError};

/// The two HDL dialects the pipeline understands.
///
/// A `systemverilog` fence tag in AI output is folded into [`Language::Verilog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Vhdl,
    Verilog,
}

impl Language {
    /// Source file extension used for the generated file and archive member.
    pub fn file_extension(&self) -> &'static str {
        match self {
            Language::Vhdl => "vhdl",
            Language::Verilog => "v",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Vhdl => "vhdl",
            Language::Verilog => "verilog",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized, renamed HDL source plus its structural metadata.
///
/// Invariant: `entity_name` is the declared top-level design unit inside
/// `content` (the declaration sites have been rewritten to it).
#[derive(Debug, Clone)]
pub struct ParsedHdl {
    pub content: String,
    pub language: Language,
    pub entity_name: String,
    pub metadata: HdlMetadata,
}

impl ParsedHdl {
    /// File name the source is written under (`<entity>.<ext>`).
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.entity_name, self.language.file_extension())
    }
}
