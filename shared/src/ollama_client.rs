use actix_web::http::header;
use awc::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::catalog::ModelCatalog;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: GenerationOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

pub fn msg(role: &str, txt: &str) -> ChatMessage {
    ChatMessage {
        role: role.to_string(),
        content: txt.to_string(),
    }
}

/// Sampling options passed through to the daemon.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GenerationOptions {
    pub num_predict: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub repeat_penalty: f32,
}

impl GenerationOptions {
    /// One-token request used to check that a model actually answers.
    pub fn probe() -> Self {
        Self {
            num_predict: 1,
            temperature: 0.1,
            top_p: 1.0,
            repeat_penalty: 1.0,
        }
    }

    pub fn generation(max_new_tokens: u32) -> Self {
        Self {
            num_predict: max_new_tokens,
            temperature: 0.7,
            top_p: 0.9,
            repeat_penalty: 1.2,
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("unknown model: {0}")]
    UnknownModel(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("parse error: {0}")]
    Parse(serde_json::Error),
    #[error("http error: {0}")]
    Http(u16),
}

pub fn ollama_base_url() -> String {
    std::env::var("OLLAMA_API_BASE").unwrap_or_else(|_| "http://127.0.0.1:11434".into())
}

/// Send chat messages to the Ollama daemon and return the assistant's
/// answer verbatim.
///
/// Logs status, headers and raw body on failure.
pub async fn call_ollama_chat(
    client: &Client,
    model: &str,
    messages: Vec<ChatMessage>,
    options: GenerationOptions,
) -> Result<String, ModelError> {
    let req = ChatRequest {
        model,
        messages: &messages,
        stream: false,
        options,
    };

    let url = format!("{}/api/chat", ollama_base_url());
    debug!("\u{2192} ollama request: model = {}", req.model);
    let mut res = client
        .post(url)
        .insert_header((header::ACCEPT, "application/json"))
        .send_json(&req)
        .await
        .map_err(|e| {
            error!("network error to ollama: {e}");
            ModelError::Network(e.to_string())
        })?;

    debug!(status = %res.status(), "\u{2190} headers = {:?}", res.headers());
    let bytes = res
        .body()
        .await
        .map_err(|e| ModelError::Network(e.to_string()))?;
    debug!(
        "\u{2190} body = {}",
        String::from_utf8_lossy(&bytes[..bytes.len().min(1024)])
    );

    if !res.status().is_success() {
        return Err(ModelError::Http(res.status().as_u16()));
    }

    let chat: ChatResponse = serde_json::from_slice(&bytes).map_err(ModelError::Parse)?;
    Ok(chat.message.content)
}

/// JSON shape the models are asked to produce. Appended to every user
/// prompt; the recovery pipeline copes with the answers that ignore it.
pub fn format_instructions() -> &'static str {
    "{\n  \"summary\": \"brief summary of the question\",\n  \"response\": \"detailed helpful answer with proper formatting\"\n}"
}

/// Resolve a short model key through the catalog and run a single chat
/// completion against the daemon.
pub async fn respond(
    client: &Client,
    catalog: &ModelCatalog,
    model_key: &str,
    system_prompt: &str,
    user_prompt: &str,
    max_new_tokens: u32,
) -> Result<String, ModelError> {
    let model = catalog
        .resolve(model_key)
        .ok_or_else(|| ModelError::UnknownModel(model_key.to_string()))?;

    let user = format!(
        "{}\n\nPlease provide a helpful response in this exact JSON format:\n{}",
        user_prompt,
        format_instructions()
    );
    let messages = vec![msg("system", system_prompt), msg("user", &user)];

    call_ollama_chat(
        client,
        model,
        messages,
        GenerationOptions::generation(max_new_tokens),
    )
    .await
}
