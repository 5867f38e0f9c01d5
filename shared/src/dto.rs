use serde::{Deserialize, Serialize};

/// Body of `POST /generate`. Both fields are optional so the handler
/// can answer with a descriptive validation error instead of a bare
/// deserialization failure.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Caller-facing result. `summary` and `response` are always present
/// and always strings; `duration` is the elapsed handler time in
/// seconds.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub summary: String,
    pub response: String,
    pub duration: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
