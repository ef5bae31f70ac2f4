use crate::config::Settings;
use crate::providers::traits::OcrProvider;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};

const OCR_URL: &str = "https://api.mistral.ai/v1/ocr";

/// Mistral hosted OCR. The image travels as a base64 data URL; the response
/// carries one markdown block per detected page.
#[derive(Clone)]
pub struct MistralOcr {
    api_key: String,
    model: String,
    client: Client,
}

impl MistralOcr {
    pub fn new(settings: &Settings) -> Self {
        Self {
            api_key: settings.mistral_api_key.clone(),
            model: settings.mistral_ocr_model.clone(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl OcrProvider for MistralOcr {
    async fn extract_pages(&self, image: &[u8], mime: &str) -> Result<Vec<String>> {
        let encoded = STANDARD.encode(image);
        let data_url = format!("data:{};base64,{}", mime, encoded);

        let response = self
            .client
            .post(OCR_URL)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "document": {
                    "type": "image_url",
                    "image_url": data_url
                }
            }))
            .send()
            .await?
            .error_for_status()?;

        let response_json: Value = response.json().await?;

        let pages = response_json["pages"]
            .as_array()
            .ok_or_else(|| anyhow!("OCR response has no pages"))?;

        Ok(pages
            .iter()
            .map(|page| {
                page["markdown"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string()
            })
            .collect())
    }
}
