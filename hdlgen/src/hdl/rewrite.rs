//! Normalization, the minimal well-formedness gate, and top-level identifier
//! rewriting.
//!
//! These are deliberately anchored regexes, not a parser: the only structural
//! fact the pipeline needs is "where is the top-level declaration name".
//! Deeper semantic validation belongs to the external compilers.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::Language;

/// Minimal structural problems in extracted code.
#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error("VHDL code must contain an entity declaration")]
    MissingEntity,
    #[error("VHDL code must contain an architecture declaration")]
    MissingArchitecture,
    #[error("Verilog code must contain a module declaration")]
    MissingModule,
    #[error("Verilog code must contain an endmodule statement")]
    MissingEndmodule,
}

static VHDL_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bentity\s+(\w+)\s+is").expect("entity pattern is valid"));
static VHDL_ARCHITECTURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\barchitecture\s+\w+\s+of\s+\w+\s+is").expect("architecture pattern is valid")
});
static VERILOG_MODULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bmodule\s+(\w+)").expect("module pattern is valid"));
static VERILOG_ENDMODULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bendmodule\b").expect("endmodule pattern is valid"));

/// Strip trailing whitespace per line and drop fully blank leading/trailing
/// lines. Interior blank lines and indentation are preserved.
pub fn normalize(code: &str) -> String {
    let lines: Vec<&str> = code.lines().map(str::trim_end).collect();
    let start = lines
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map(|i| i + 1)
        .unwrap_or(start);
    lines[start..end].join("\n")
}

/// Minimal well-formedness gate, intentionally permissive about body contents.
pub fn validate_syntax(code: &str, language: Language) -> Result<(), SyntaxError> {
    match language {
        Language::Vhdl => {
            if !VHDL_ENTITY.is_match(code) {
                return Err(SyntaxError::MissingEntity);
            }
            if !VHDL_ARCHITECTURE.is_match(code) {
                return Err(SyntaxError::MissingArchitecture);
            }
        }
        Language::Verilog => {
            if !VERILOG_MODULE.is_match(code) {
                return Err(SyntaxError::MissingModule);
            }
            if !VERILOG_ENDMODULE.is_match(code) {
                return Err(SyntaxError::MissingEndmodule);
            }
        }
    }
    Ok(())
}

/// Name of the first entity/module declaration, if any.
pub fn extract_entity_name(code: &str, language: Language) -> Option<String> {
    let re = match language {
        Language::Vhdl => &*VHDL_ENTITY,
        Language::Verilog => &*VERILOG_MODULE,
    };
    re.captures(code).map(|caps| caps[1].to_string())
}

/// Rewrite the top-level declaration sites from `old_name` to `new_name`.
///
/// Only declaration sites are touched: the `entity ... is` line and the
/// `architecture ... of ... is` line for VHDL, the `module ...` line for
/// Verilog. Other occurrences of the old name in the body (e.g. a testbench
/// instantiating the design under its old name) are left as-is; that is the
/// documented behavior, not an oversight. Matches are word-bounded so an
/// unrelated identifier merely containing `old_name` is never altered.
pub fn rename_entity(code: &str, old_name: &str, new_name: &str, language: Language) -> String {
    if old_name == new_name {
        return code.to_string();
    }
    let old = regex::escape(old_name);
    match language {
        Language::Vhdl => {
            let entity_re = Regex::new(&format!(r"(?i)\bentity\s+{old}\s+is"))
                .expect("escaped identifier keeps the pattern valid");
            let arch_re = Regex::new(&format!(r"(?i)\barchitecture\s+(\w+)\s+of\s+{old}\s+is"))
                .expect("escaped identifier keeps the pattern valid");
            let code = entity_re.replace_all(code, format!("entity {new_name} is"));
            arch_re
                .replace_all(&code, format!("architecture $1 of {new_name} is"))
                .into_owned()
        }
        Language::Verilog => {
            let module_re = Regex::new(&format!(r"(?i)\bmodule\s+{old}\b"))
                .expect("escaped identifier keeps the pattern valid");
            module_re
                .replace_all(code, format!("module {new_name}"))
                .into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VHDL_AND: &str = "entity foo is\n  port (a, b : in bit; y : out bit);\nend foo;\n\narchitecture rtl of foo is\nbegin\n  y <= a and b;\nend rtl;";

    #[test]
    fn test_normalize_strips_padding() {
        let code = "\n\n  entity x is  \n\n  end x;\t\n\n\n";
        let cleaned = normalize(code);
        assert_eq!(cleaned, "  entity x is\n\n  end x;");
    }

    #[test]
    fn test_normalize_blank_only_input() {
        assert_eq!(normalize("\n   \n\t\n"), "");
    }

    #[test]
    fn test_validate_vhdl_missing_architecture() {
        let err = validate_syntax("entity x is\nend x;", Language::Vhdl).unwrap_err();
        assert!(err.to_string().contains("architecture declaration"));
    }

    #[test]
    fn test_validate_verilog_missing_endmodule() {
        let err = validate_syntax("module x(input a);", Language::Verilog).unwrap_err();
        assert!(err.to_string().contains("endmodule"));
    }

    #[test]
    fn test_validate_accepts_minimal_designs() {
        assert!(validate_syntax(VHDL_AND, Language::Vhdl).is_ok());
        assert!(validate_syntax("module m;\nendmodule", Language::Verilog).is_ok());
    }

    #[test]
    fn test_extract_entity_name() {
        assert_eq!(
            extract_entity_name(VHDL_AND, Language::Vhdl).as_deref(),
            Some("foo")
        );
        assert_eq!(
            extract_entity_name("module counter4 (input clk);\nendmodule", Language::Verilog)
                .as_deref(),
            Some("counter4")
        );
        assert_eq!(extract_entity_name("no hdl here", Language::Vhdl), None);
    }

    #[test]
    fn test_rename_vhdl_declaration_sites() {
        let renamed = rename_entity(VHDL_AND, "foo", "bar", Language::Vhdl);
        assert!(renamed.contains("entity bar is"));
        assert!(renamed.contains("architecture rtl of bar is"));
        assert!(!renamed.contains("entity foo is"));
        assert!(!renamed.contains("of foo is"));
    }

    #[test]
    fn test_rename_is_word_bounded() {
        let code = "entity foo is\nend foo;\narchitecture a of foo is\n-- foobar stays\nbegin\nend a;";
        let renamed = rename_entity(code, "foo", "bar", Language::Vhdl);
        assert!(renamed.contains("foobar stays"));
        assert!(renamed.contains("entity bar is"));
    }

    #[test]
    fn test_rename_same_name_is_noop() {
        assert_eq!(rename_entity(VHDL_AND, "foo", "foo", Language::Vhdl), VHDL_AND);
    }

    #[test]
    fn test_rename_verilog_keeps_body() {
        let code = "module counter4 (input clk);\n  // counter4 body comment\nendmodule";
        let renamed = rename_entity(code, "counter4", "ctr", Language::Verilog);
        assert!(renamed.starts_with("module ctr "));
        assert!(renamed.contains("endmodule"));
        // Body references are deliberately untouched.
        assert!(renamed.contains("counter4 body comment"));
    }
}
