use crate::config::Settings;
use crate::providers::traits::CompletionProvider;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Generative Language API: chat completions against the configured
/// chat model, embeddings against `text-embedding-004`.
#[derive(Clone)]
pub struct GeminiProvider {
    api_key: String,
    chat_model: String,
    embedding_model: String,
    temperature: f32,
    max_output_tokens: u32,
    client: Client,
}

impl GeminiProvider {
    pub fn new(settings: &Settings) -> Self {
        Self {
            api_key: settings.gemini_api_key.clone(),
            chat_model: settings.gemini_chat_model.clone(),
            embedding_model: settings.gemini_embedding_model.clone(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", API_BASE, self.chat_model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "contents": [{
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }],
                "generationConfig": {
                    "temperature": self.temperature,
                    "maxOutputTokens": self.max_output_tokens
                }
            }))
            .send()
            .await?
            .error_for_status()?;

        let response_json: Value = response.json().await?;

        response_json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("Gemini returned no text candidate"))
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/models/{}:embedContent", API_BASE, self.embedding_model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "content": {
                    "parts": [{ "text": text }]
                }
            }))
            .send()
            .await?
            .error_for_status()?;

        let response_json: Value = response.json().await?;

        let values = response_json["embedding"]["values"]
            .as_array()
            .ok_or_else(|| anyhow!("Gemini embedding response has no values"))?;

        values
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| anyhow!("Non-numeric value in embedding response"))
            })
            .collect()
    }

    fn model_info(&self) -> String {
        self.chat_model.clone()
    }
}
