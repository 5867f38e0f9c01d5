//! Terminal fallback and final assembly: turns raw daemon output into
//! the two-field record the boundary layer returns.

use serde_json::Value;

use crate::json_relaxed::{extract_candidate, Candidate};
use crate::normalize::normalize_text;
use crate::ollama_client::ModelError;

pub const EMPTY_RESPONSE_APOLOGY: &str =
    "I apologize, but I couldn't generate a proper response. Please try rephrasing your question.";

/// Fully normalized caller-facing result. The boundary handler attaches
/// the elapsed time and serializes it as a `GenerateResponse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredReply {
    pub summary: String,
    pub response: String,
}

/// Single entry point for the boundary layer: extractor first, the
/// plain-text segmenter when no structure was found, then
/// normalization of both fields.
pub fn recover_reply(raw: &str, user_prompt: &str) -> RecoveredReply {
    let candidate = extract_candidate(raw, user_prompt)
        .unwrap_or_else(|_| segment_plain_text(raw, user_prompt));
    RecoveredReply {
        summary: normalize_text(&candidate.summary),
        response: flatten_response(candidate.response),
    }
}

/// Manufacture a record from plain prose: keep lines that are not
/// empty, not stray braces, and not leftover role markers, joined by
/// single spaces. Never fails.
pub fn segment_plain_text(text: &str, user_prompt: &str) -> Candidate {
    let kept: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with('{')
                && !line.starts_with("User:")
                && !line.starts_with("Assistant:")
        })
        .collect();
    let response = kept.join(" ");
    let response = if response.trim().is_empty() {
        EMPTY_RESPONSE_APOLOGY.to_string()
    } else {
        response
    };
    Candidate {
        summary: format!("User asked: {user_prompt}"),
        response: Value::String(response),
    }
}

/// The daemon occasionally hands back a structured payload instead of
/// text; callers always receive a string, and an absent value becomes
/// the empty string rather than propagating.
fn flatten_response(value: Value) -> String {
    match value {
        Value::String(s) => normalize_text(&s),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Error-shaped record used when the model call itself failed; the
/// boundary layer still returns a success-shaped payload.
pub fn error_reply(err: &ModelError) -> RecoveredReply {
    RecoveredReply {
        summary: "Error occurred".to_string(),
        response: format!("Sorry, an error occurred while generating the response: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strict_output_round_trips() {
        let reply = recover_reply(
            "  {\"summary\": \"Weather query\", \"response\": \"It is sunny.\"}  ",
            "weather?",
        );
        assert_eq!(reply.summary, "Weather query");
        assert_eq!(reply.response, "It is sunny.");
    }

    #[test]
    fn wrapped_output_is_recovered() {
        let reply = recover_reply(
            "Sure! {\"summary\":\"Greeting\",\"response\":\"Hello there!\"} Hope that helps!",
            "hi",
        );
        assert_eq!(reply.summary, "Greeting");
        assert_eq!(reply.response, "Hello there!");
    }

    #[test]
    fn trailing_comma_output_is_recovered() {
        let reply = recover_reply("{\"summary\":\"Math\",\"response\":\"2+2=4\",}", "2+2?");
        assert_eq!(reply.summary, "Math");
        assert_eq!(reply.response, "2+2=4");
    }

    #[test]
    fn prose_falls_back_to_the_segmenter() {
        let reply = recover_reply(
            "I think the answer is 42, no JSON here.",
            "What is the answer?",
        );
        assert_eq!(reply.summary, "User asked: What is the answer?");
        assert_eq!(reply.response, "I think the answer is 42, no JSON here.");
    }

    #[test]
    fn segmenter_drops_role_markers_and_braces() {
        let c = segment_plain_text(
            "User: hello\n{\nAssistant: hi\n\nFirst line.\n  Second line.  \n",
            "q",
        );
        assert_eq!(c.summary, "User asked: q");
        assert_eq!(c.response, json!("First line. Second line."));
    }

    #[test]
    fn segmenter_never_returns_an_empty_response() {
        let c = segment_plain_text("User: hello\n\n{", "q");
        assert_eq!(c.response, json!(EMPTY_RESPONSE_APOLOGY));
    }

    #[test]
    fn nested_response_string_reparses_to_the_same_object() {
        let raw = "{\"summary\":\"s\",\"response\":\"{\\\"city\\\": \\\"Oslo\\\", \\\"temp\\\": 4}\"}";
        let reply = recover_reply(raw, "weather in oslo?");
        let nested: Value = serde_json::from_str(&reply.response).unwrap();
        assert_eq!(nested, json!({"city": "Oslo", "temp": 4}));
    }

    #[test]
    fn structured_response_value_is_flattened_to_a_string() {
        let reply = recover_reply("{\"summary\":\"s\",\"response\":{\"a\":1}}", "q");
        let nested: Value = serde_json::from_str(&reply.response).unwrap();
        assert_eq!(nested, json!({"a": 1}));
    }

    #[test]
    fn null_response_becomes_the_empty_string() {
        let reply = recover_reply("{\"summary\":\"s\",\"response\":null}", "q");
        assert_eq!(reply.response, "");
    }

    #[test]
    fn failed_model_call_yields_a_readable_record() {
        let err = ModelError::Http(500);
        let reply = error_reply(&err);
        assert_eq!(reply.summary, "Error occurred");
        assert!(!reply.response.is_empty());
        assert!(reply.response.contains("http error: 500"));
    }
}
