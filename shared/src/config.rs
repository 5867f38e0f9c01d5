use serde::Deserialize;

/// Short model keys mapped to the full Ollama identifiers they stand for.
/// The catalog probes each entry at startup and keeps the reachable ones.
pub const SUPPORTED_MODELS: &[(&str, &str)] = &[
    ("gemma2-2b", "gemma2:2b"),
    ("llama3.2-3b", "llama3.2:3b"),
];

fn default_bind_addr() -> String {
    "0.0.0.0:5000".into()
}

fn default_max_new_tokens() -> u32 {
    2048
}

fn default_model_inventory_path() -> String {
    "local_models.json".into()
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    #[serde(default = "default_model_inventory_path")]
    pub model_inventory_path: String,
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::default())
            .build()?
            .try_deserialize()
    }
}
