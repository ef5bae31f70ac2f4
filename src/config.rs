use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
    #[error("{0} is not a valid number")]
    Invalid(&'static str),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub gemini_api_key: String,
    pub gemini_chat_model: String,
    pub gemini_embedding_model: String,
    pub mistral_api_key: String,
    pub mistral_ocr_model: String,
    pub qdrant_url: String,
    pub qdrant_collection: String,
    pub top_k: u64,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

fn require_env(var: &'static str) -> Result<String, ConfigError> {
    env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(var))
}

fn env_or(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let top_k = env::var("RAG_TOP_K")
            .map(|v| v.parse().map_err(|_| ConfigError::Invalid("RAG_TOP_K")))
            .unwrap_or(Ok(6))?;

        let temperature = env::var("GEMINI_TEMPERATURE")
            .map(|v| v.parse().map_err(|_| ConfigError::Invalid("GEMINI_TEMPERATURE")))
            .unwrap_or(Ok(0.2))?;

        let max_output_tokens = env::var("GEMINI_MAX_OUTPUT_TOKENS")
            .map(|v| {
                v.parse()
                    .map_err(|_| ConfigError::Invalid("GEMINI_MAX_OUTPUT_TOKENS"))
            })
            .unwrap_or(Ok(800))?;

        Ok(Self {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_chat_model: env_or("GEMINI_CHAT_MODEL", "gemma-3-27b-it"),
            gemini_embedding_model: env_or("GEMINI_EMBEDDING_MODEL", "text-embedding-004"),
            mistral_api_key: require_env("MISTRAL_API_KEY")?,
            mistral_ocr_model: env_or("MISTRAL_OCR_MODEL", "mistral-ocr-latest"),
            qdrant_url: require_env("QDRANT_URL")?,
            qdrant_collection: env_or("QDRANT_COLLECTION", "products_vector"),
            top_k,
            temperature,
            max_output_tokens,
        })
    }
}
