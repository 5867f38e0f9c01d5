//! HTTP boundary for the chat front end: validates incoming requests
//! against the model catalog, drives one daemon call per request, and
//! returns the recovered record with timing attached.

use std::time::Instant;

use actix_web::{web, HttpResponse, Responder};
use awc::Client;
use tracing::{error, warn};

use shared::catalog::ModelCatalog;
use shared::config::Settings;
use shared::dto::{ErrorResponse, GenerateRequest, GenerateResponse, ModelsResponse};
use shared::ollama_client::respond;
use shared::recovery::{error_reply, recover_reply};

/// Instructs the models to answer with the bare two-key JSON object.
/// The recovery pipeline handles everything they produce anyway.
pub const SYSTEM_PROMPT: &str = "You are an AI assistant. Your ONLY response should be a single \
valid JSON object, with no extra text, no markdown, no comments, no explanations, and no \
additional fields. The JSON must have exactly two keys: \"summary\" and \"response\". Example: \
{\"summary\": \"Short summary of the question.\", \"response\": \"Detailed helpful answer.\"} \
Do not include any other text, formatting, or fields. If you cannot answer, still return a valid \
JSON object with both keys, and leave the values empty.";

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub catalog: ModelCatalog,
}

pub async fn health() -> impl Responder {
    "OK"
}

pub async fn list_models(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(ModelsResponse {
        models: data.catalog.available_models(),
    })
}

pub async fn generate(
    data: web::Data<AppState>,
    body: web::Json<GenerateRequest>,
) -> impl Responder {
    let message = body.message.clone().unwrap_or_default();
    let model = body.model.clone().unwrap_or_default();

    if message.is_empty() || model.is_empty() || !data.catalog.contains(&model) {
        let available = data.catalog.available_models();
        let error = format!(
            "Missing or invalid message or model selection. Received: message='{message}', \
             model='{model}'. Available models: {available:?}"
        );
        warn!("validation failed: {error}");
        return HttpResponse::BadRequest().json(ErrorResponse { error });
    }

    let start = Instant::now();
    let client = Client::default();
    let reply = match respond(
        &client,
        &data.catalog,
        &model,
        SYSTEM_PROMPT,
        &message,
        data.settings.max_new_tokens,
    )
    .await
    {
        Ok(raw) => recover_reply(&raw, &message),
        Err(e) => {
            error!("model call failed: {e}");
            error_reply(&e)
        }
    };

    HttpResponse::Ok().json(GenerateResponse {
        summary: reply.summary,
        response: reply.response,
        duration: start.elapsed().as_secs_f64(),
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/models", web::get().to(list_models))
        .route("/generate", web::post().to(generate));
}
