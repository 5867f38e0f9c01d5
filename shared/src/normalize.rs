//! Field-level cleanup applied to recovered values before they reach
//! the caller. Idempotent: normalizing an already-normalized string is
//! a no-op.

use serde_json::Value;

/// Trim, strip one layer of surrounding double quotes, unescape the
/// literal `\n`, `\"` and `\t` sequences, and re-serialize values that
/// turn out to be embedded JSON so callers never see an escaped blob.
///
/// The quote strip runs again after unescaping: escaped quotes can
/// become surrounding ones, and leaving them would make a second pass
/// produce a different string.
pub fn normalize_text(value: &str) -> String {
    let text = strip_quote_layer(value.trim());
    let cleaned = text
        .replace("\\n", "\n")
        .replace("\\\"", "\"")
        .replace("\\t", "\t");
    let trimmed = cleaned.trim();
    if looks_like_json(trimmed) {
        if let Ok(parsed) = serde_json::from_str::<Value>(trimmed) {
            if let Ok(serialized) = serde_json::to_string(&parsed) {
                return serialized;
            }
        }
    }
    strip_quote_layer(trimmed).to_string()
}

fn strip_quote_layer(text: &str) -> &str {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

/// Cheap shape check before attempting a real parse.
fn looks_like_json(text: &str) -> bool {
    (text.starts_with('{') && text.ends_with('}'))
        || (text.starts_with('[') && text.ends_with(']'))
}
