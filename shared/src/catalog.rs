use std::collections::BTreeMap;

use awc::Client;
use tracing::{info, warn};

use crate::config::SUPPORTED_MODELS;
use crate::error::{AppError, Result};
use crate::ollama_client::{call_ollama_chat, msg, GenerationOptions};

/// Short model keys mapped to the full Ollama identifiers that answered
/// the startup probe. Built once before the server accepts requests and
/// read-only afterwards; concurrent handlers share it without locking.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: BTreeMap<String, String>,
}

impl ModelCatalog {
    /// Probe every configured model with a one-token request and keep
    /// the ones the daemon can actually serve.
    pub async fn initialize(client: &Client) -> Self {
        let mut models = BTreeMap::new();
        for (key, name) in SUPPORTED_MODELS.iter().copied() {
            let probe = vec![msg("user", "Hello")];
            match call_ollama_chat(client, name, probe, GenerationOptions::probe()).await {
                Ok(_) => {
                    info!(model = name, "model loaded");
                    models.insert(key.to_string(), name.to_string());
                }
                Err(e) => {
                    warn!(model = name, "model unavailable: {e}");
                }
            }
        }
        info!("model initialization complete, {} models loaded", models.len());
        Self { models }
    }

    /// Catalog from fixed entries, skipping the probe. Used by tests
    /// and tooling that already know what the daemon serves.
    pub fn from_entries(entries: &[(&str, &str)]) -> Self {
        let models = entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { models }
    }

    /// Short keys of the models that are currently usable.
    pub fn available_models(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.models.contains_key(key)
    }

    pub fn resolve(&self, key: &str) -> Option<&str> {
        self.models.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Dump the discovered full identifiers as a flat JSON array for
    /// operator inspection. Informational only, never read back.
    pub fn write_inventory(&self, path: &str) -> Result<()> {
        let names: Vec<&String> = self.models.values().collect();
        let json = serde_json::to_string_pretty(&names).map_err(|e| AppError::Io(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| AppError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_resolve_to_full_identifiers() {
        let catalog = ModelCatalog::from_entries(&[("gemma2-2b", "gemma2:2b")]);
        assert_eq!(catalog.resolve("gemma2-2b"), Some("gemma2:2b"));
        assert_eq!(catalog.resolve("nope"), None);
        assert!(catalog.contains("gemma2-2b"));
        assert_eq!(catalog.available_models(), vec!["gemma2-2b".to_string()]);
    }

    #[test]
    fn inventory_is_a_flat_json_array() {
        let catalog = ModelCatalog::from_entries(&[
            ("gemma2-2b", "gemma2:2b"),
            ("llama3.2-3b", "llama3.2:3b"),
        ]);
        // Unique per process so concurrent suite runs don't race.
        let path = std::env::temp_dir().join(format!(
            "catalog_inventory_test_{}.json",
            std::process::id()
        ));
        catalog.write_inventory(path.to_str().unwrap()).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, vec!["gemma2:2b", "llama3.2:3b"]);
        let _ = std::fs::remove_file(&path);
    }
}
