//! Re-exports the shared building blocks consumed by the chat-api
//! service: configuration handling, DTOs, the Ollama client and model
//! catalog, and the lenient response-recovery pipeline.

pub mod catalog;
pub mod config;
pub mod dto;
pub mod error;
pub mod json_relaxed;
pub mod normalize;
pub mod ollama_client;
pub mod recovery;
