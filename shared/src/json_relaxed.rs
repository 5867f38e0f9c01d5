//! Lenient recovery of the `{summary, response}` object from loosely
//! formatted model output: strict parse first, then brace-span
//! extraction, then an ordered repair pass, then per-field regexes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

/// Unvalidated two-field guess extracted from raw model output.
/// `response` keeps whatever shape the model produced; the assembler
/// flattens it to a string.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub summary: String,
    pub response: Value,
}

/// Marker returned when no stage produced a usable record. Recovered
/// by the plain-text segmenter, never surfaced to callers.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("no recoverable JSON structure found")]
pub struct ExtractError;

pub const MISSING_RESPONSE_APOLOGY: &str =
    "I apologize, but I couldn't generate a complete response.";

/// One textual fixup applied to near-valid JSON before re-parsing.
struct RepairRule {
    name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

/// Ordered repair table. `unescape-literal-newlines` introduces real
/// control characters into string values; `collapse-whitespace` must
/// stay last so they are folded back into spaces before re-parsing.
static REPAIR_RULES: Lazy<Vec<RepairRule>> = Lazy::new(|| {
    let rule = |name, pattern: &str, replacement| RepairRule {
        name,
        pattern: Regex::new(pattern).expect("repair rule pattern"),
        replacement,
    };
    vec![
        rule("strip-line-comments", r"(?m)//.*$", ""),
        rule("strip-block-comments", r"(?s)/\*.*?\*/", ""),
        rule("drop-empty-string-artifacts", r#",\s*"""#, ""),
        rule("unescape-literal-newlines", r"\\n", "\n"),
        rule("drop-trailing-commas", r",\s*([}\]])", "$1"),
        rule(
            "default-null-sentiment",
            r#""sentiment"\s*:\s*null"#,
            r#""sentiment": 50"#,
        ),
        rule("collapse-whitespace", r"\s+", " "),
    ]
});

static SUMMARY_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"summary"\s*:\s*"([^"]*)""#).expect("summary field pattern"));
static RESPONSE_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)"response"\s*:\s*"(.*?)""#).expect("response field pattern"));

/// Run the stages in order; the first one that yields an accepted
/// record wins.
pub fn extract_candidate(text: &str, user_prompt: &str) -> Result<Candidate, ExtractError> {
    parse_strict(text)
        .or_else(|_| parse_span(text))
        .or_else(|_| parse_repaired(text))
        .or_else(|_| extract_fields(text, user_prompt))
}

/// Apply the repair table in order and return the rewritten text.
pub fn apply_repairs(text: &str) -> String {
    let mut out = text.to_string();
    for rule in REPAIR_RULES.iter() {
        let next = rule.pattern.replace_all(&out, rule.replacement);
        if next != out {
            debug!(rule = rule.name, "repair rule applied");
        }
        out = next.into_owned();
    }
    out
}

/// Stage 1: the whole trimmed text must be valid JSON and decode to an
/// object; no partial parse.
fn parse_strict(text: &str) -> Result<Candidate, ExtractError> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => accept(&map),
        _ => Err(ExtractError),
    }
}

/// Slice from the first `{` to the last `}` so commentary the model
/// wrapped around the object is ignored.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Stage 2: strict parse of the brace span.
fn parse_span(text: &str) -> Result<Candidate, ExtractError> {
    let span = brace_span(text).ok_or(ExtractError)?;
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => accept(&map),
        _ => Err(ExtractError),
    }
}

/// Stage 3: repair the brace span, then re-parse.
fn parse_repaired(text: &str) -> Result<Candidate, ExtractError> {
    let span = brace_span(text).ok_or(ExtractError)?;
    let repaired = apply_repairs(span);
    match serde_json::from_str::<Value>(&repaired) {
        Ok(Value::Object(map)) => accept(&map),
        _ => Err(ExtractError),
    }
}

/// Stage 4: fish the two fields out individually and fill whichever is
/// missing with a placeholder. Fails only when neither field matches.
fn extract_fields(text: &str, user_prompt: &str) -> Result<Candidate, ExtractError> {
    let summary = SUMMARY_FIELD.captures(text).map(|c| c[1].to_string());
    let response = RESPONSE_FIELD.captures(text).map(|c| c[1].to_string());
    if summary.is_none() && response.is_none() {
        return Err(ExtractError);
    }
    Ok(Candidate {
        summary: summary.unwrap_or_else(|| format!("User asked: {user_prompt}")),
        response: Value::String(
            response.unwrap_or_else(|| MISSING_RESPONSE_APOLOGY.to_string()),
        ),
    })
}

/// A decoded mapping is accepted only when both required keys are
/// present; extra keys are ignored, not rejected.
fn accept(map: &Map<String, Value>) -> Result<Candidate, ExtractError> {
    let (Some(summary), Some(response)) = (map.get("summary"), map.get("response")) else {
        return Err(ExtractError);
    };
    Ok(Candidate {
        summary: value_to_text(summary),
        response: response.clone(),
    })
}

/// Strings pass through; anything else is serialized compactly.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
