//! Request validation and input sanitization.
//!
//! Everything here runs before any network call or filesystem write, so a
//! malformed request is rejected cheaply with a field-naming diagnostic.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::ai::GenerationParams;

pub const MIN_PROMPT_LENGTH: usize = 10;
pub const MAX_PROMPT_LENGTH: usize = 10_000;
pub const MAX_CIRCUIT_NAME_LENGTH: usize = 100;
const MAX_SANITIZED_NAME_LENGTH: usize = 50;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Prompt too short (minimum {MIN_PROMPT_LENGTH} characters)")]
    PromptTooShort,
    #[error("Prompt too long (maximum {MAX_PROMPT_LENGTH} characters)")]
    PromptTooLong,
    #[error("Prompt contains potentially harmful content")]
    SuspiciousPrompt,
    #[error("Circuit name cannot be empty")]
    EmptyCircuitName,
    #[error("Circuit name too long (maximum {MAX_CIRCUIT_NAME_LENGTH} characters)")]
    CircuitNameTooLong,
    #[error("Circuit name can only contain letters, numbers, underscores, and hyphens")]
    InvalidCircuitNameCharacters,
    #[error("Circuit name must start with a letter or underscore")]
    InvalidCircuitNameStart,
    #[error("Circuit name \"{0}\" is a reserved keyword")]
    ReservedKeyword(String),
    #[error("Temperature must be a number between 0 and 2")]
    TemperatureOutOfRange,
    #[error("max_tokens must be an integer between 1 and 8000")]
    MaxTokensOutOfRange,
    #[error("top_p must be a number between 0 and 1")]
    TopPOutOfRange,
}

static SUSPICIOUS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)<script[^>]*>",
        r"(?i)javascript:",
        r"(?i)data:text/html",
        r"(?i)vbscript:",
        r"(?i)onload\s*=",
        r"(?i)onerror\s*=",
        r"(?i)eval\s*\(",
        r"(?i)exec\s*\(",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("suspicious pattern is valid"))
    .collect()
});

static VALID_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("name pattern is valid"));
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("unsafe chars pattern is valid"));
static REPEATED_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("underscore pattern is valid"));

/// HDL keywords a design unit must not be named after.
const RESERVED_KEYWORDS: &[&str] = &[
    "and", "or", "not", "xor", "nand", "nor", "xnor", "begin", "end", "if", "then", "else", "case",
    "when", "process", "signal", "variable", "entity", "architecture", "library", "use", "package",
    "component", "port", "map", "module", "endmodule", "always", "initial", "wire", "reg", "input",
    "output", "inout", "parameter", "assign",
];

/// Validate the natural-language prompt.
pub fn validate_prompt(prompt: &str) -> Result<(), ValidationError> {
    // Bounds are in characters, not bytes, so multi-byte scripts are not
    // penalized.
    let length = prompt.chars().count();
    if length < MIN_PROMPT_LENGTH {
        return Err(ValidationError::PromptTooShort);
    }
    if length > MAX_PROMPT_LENGTH {
        return Err(ValidationError::PromptTooLong);
    }
    if SUSPICIOUS_PATTERNS.iter().any(|p| p.is_match(prompt)) {
        return Err(ValidationError::SuspiciousPrompt);
    }
    Ok(())
}

/// Validate the requested circuit name as an identifier-safe string.
pub fn validate_circuit_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyCircuitName);
    }
    if name.len() > MAX_CIRCUIT_NAME_LENGTH {
        return Err(ValidationError::CircuitNameTooLong);
    }
    if !VALID_NAME.is_match(name) {
        return Err(ValidationError::InvalidCircuitNameCharacters);
    }
    let first = name.chars().next().unwrap_or('_');
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(ValidationError::InvalidCircuitNameStart);
    }
    if RESERVED_KEYWORDS.contains(&name.to_lowercase().as_str()) {
        return Err(ValidationError::ReservedKeyword(name.to_string()));
    }
    Ok(())
}

/// Validate sampling parameters against the documented ranges.
pub fn validate_generation_params(params: &GenerationParams) -> Result<(), ValidationError> {
    if let Some(temperature) = params.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ValidationError::TemperatureOutOfRange);
        }
    }
    if let Some(max_tokens) = params.max_tokens {
        if !(1..=8000).contains(&max_tokens) {
            return Err(ValidationError::MaxTokensOutOfRange);
        }
    }
    if let Some(top_p) = params.top_p {
        if !(0.0..=1.0).contains(&top_p) {
            return Err(ValidationError::TopPOutOfRange);
        }
    }
    Ok(())
}

/// Force a circuit name into a filesystem- and identifier-safe form.
///
/// Never fails: degenerate input becomes `unnamed_circuit`.
pub fn sanitize_circuit_name(name: &str) -> String {
    let safe = UNSAFE_CHARS.replace_all(name, "_");
    let safe = REPEATED_UNDERSCORES.replace_all(&safe, "_");
    let mut safe = safe.trim_matches('_').to_string();

    if let Some(first) = safe.chars().next() {
        if !(first.is_ascii_alphabetic() || first == '_') {
            safe = format!("circuit_{safe}");
        }
    }
    if safe.is_empty() {
        safe = "unnamed_circuit".to_string();
    }
    if safe.len() > MAX_SANITIZED_NAME_LENGTH {
        safe.truncate(MAX_SANITIZED_NAME_LENGTH);
        safe = safe.trim_end_matches('_').to_string();
    }
    safe
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_length_bounds() {
        assert!(validate_prompt("too short").is_err());
        assert!(validate_prompt("a 4-bit synchronous counter with enable").is_ok());
        assert!(validate_prompt(&"x".repeat(MAX_PROMPT_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_prompt_bounds_count_characters_not_bytes() {
        // Each of these characters is 3 bytes in UTF-8; 4000 of them stay
        // well under the 10_000-character ceiling.
        let cjk = "計".repeat(4000);
        assert!(validate_prompt(&cjk).is_ok());
        // Ten multi-byte characters meet the minimum exactly.
        assert!(validate_prompt(&"計".repeat(10)).is_ok());
        assert!(validate_prompt(&"計".repeat(9)).is_err());
    }

    #[test]
    fn test_prompt_rejects_injection_markers() {
        let err = validate_prompt("please run <script>alert(1)</script> thanks").unwrap_err();
        assert!(matches!(err, ValidationError::SuspiciousPrompt));
    }

    #[test]
    fn test_circuit_name_rules() {
        assert!(validate_circuit_name("and_gate_2").is_ok());
        assert!(validate_circuit_name("_private").is_ok());
        assert!(validate_circuit_name("").is_err());
        assert!(validate_circuit_name("2counter").is_err());
        assert!(validate_circuit_name("my gate").is_err());
        assert!(matches!(
            validate_circuit_name("entity").unwrap_err(),
            ValidationError::ReservedKeyword(_)
        ));
        // Reserved keyword check is case-insensitive.
        assert!(validate_circuit_name("Entity").is_err());
    }

    #[test]
    fn test_params_ranges() {
        let ok = GenerationParams {
            temperature: Some(1.2),
            max_tokens: Some(4000),
            top_p: Some(0.9),
        };
        assert!(validate_generation_params(&ok).is_ok());

        let bad_temp = GenerationParams {
            temperature: Some(2.5),
            ..GenerationParams::default()
        };
        assert!(validate_generation_params(&bad_temp).is_err());

        let bad_tokens = GenerationParams {
            max_tokens: Some(0),
            ..GenerationParams::default()
        };
        assert!(validate_generation_params(&bad_tokens).is_err());
    }

    #[test]
    fn test_sanitize_circuit_name() {
        assert_eq!(sanitize_circuit_name("my cool gate!"), "my_cool_gate");
        assert_eq!(sanitize_circuit_name("4bit_adder"), "circuit_4bit_adder");
        assert_eq!(sanitize_circuit_name("___"), "unnamed_circuit");
        assert_eq!(sanitize_circuit_name(""), "unnamed_circuit");
        assert_eq!(sanitize_circuit_name("a__b___c"), "a_b_c");

        let long = sanitize_circuit_name(&"a".repeat(80));
        assert!(long.len() <= 50);
    }
}
