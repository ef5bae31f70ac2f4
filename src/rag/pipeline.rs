use crate::database::vector_db::{CandidateDocument, VectorDB};
use crate::providers::traits::{CompletionProvider, Retriever};
use crate::rag::schema::{RagAnswer, SchemaError};
use crate::rag::{parsing, prompt};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Request/pipeline error taxonomy. `Input` rejects before any remote call,
/// `Upstream` wraps failed collaborator calls, `Schema` wraps model output
/// that fails parsing or validation. Nothing is retried here.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Upstream(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// The four text channels the prompt template consumes.
#[derive(Debug, Clone)]
pub struct PromptInputs {
    pub search_query: String,
    pub user_query: String,
    pub user_profile: String,
    pub product_profile: String,
}

/// Render a nutrition value with its unit: integers without decimals, other
/// numbers rounded to two places, anything non-numeric as "n/a" (no unit).
pub fn fmt_nutrient(value: Option<&Value>, unit: &str) -> String {
    match value.and_then(coerce_number) {
        Some(n) if (n - n.round()).abs() < 1e-9 => format!("{}{}", n.round() as i64, unit),
        Some(n) => format!("{}{}", (n * 100.0).round() / 100.0, unit),
        None => "n/a".to_string(),
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn metadata_text(metadata: &std::collections::HashMap<String, Value>, key: &str) -> String {
    match metadata.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Null) | None => "n/a".to_string(),
        Some(other) => other.to_string(),
    }
}

/// One block per candidate: a header with brand, category, serving size and
/// the five per-100g fields, then the indexed snippet.
pub fn format_candidates(docs: &[CandidateDocument]) -> String {
    docs.iter()
        .map(|doc| {
            let m = &doc.metadata;
            format!(
                "- {} ({}, serving {}) Na={}, Gula={}, Serat={}, Protein={}, Lemak Jenuh={}; Alergen={}.\n  text: {}",
                metadata_text(m, "brand_name"),
                metadata_text(m, "category"),
                metadata_text(m, "serving_size_raw"),
                fmt_nutrient(m.get("sodium_mg_100g"), " mg/100g"),
                fmt_nutrient(m.get("sugars_g_100g"), " g/100g"),
                fmt_nutrient(m.get("fiber_g_100g"), " g/100g"),
                fmt_nutrient(m.get("protein_g_100g"), " g/100g"),
                fmt_nutrient(m.get("fat_sat_g_100g"), " g/100g"),
                metadata_text(m, "allergens"),
                doc.text,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Similarity search against the candidate-product collection: embed the
/// query, then take the K nearest neighbours. K comes from configuration.
pub struct ProductRetriever {
    vector_db: VectorDB,
    embedder: Arc<dyn CompletionProvider>,
    collection: String,
    top_k: u64,
}

impl ProductRetriever {
    pub fn new(
        vector_db: VectorDB,
        embedder: Arc<dyn CompletionProvider>,
        collection: String,
        top_k: u64,
    ) -> Self {
        Self {
            vector_db,
            embedder,
            collection,
            top_k,
        }
    }
}

#[async_trait]
impl Retriever for ProductRetriever {
    async fn retrieve(&self, query: &str) -> anyhow::Result<Vec<CandidateDocument>> {
        let embedding = self.embedder.generate_embedding(query).await?;
        let docs = self
            .vector_db
            .search_vectors(&self.collection, embedding, self.top_k)
            .await?;
        Ok(docs)
    }
}

/// The whole request flow after input collection: retrieve, format context,
/// render prompt, call the model, recover and validate its output. One pass,
/// no retries, no branching on partial success.
pub struct RagPipeline {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn CompletionProvider>,
}

impl RagPipeline {
    pub fn new(retriever: Arc<dyn Retriever>, llm: Arc<dyn CompletionProvider>) -> Self {
        Self { retriever, llm }
    }

    pub async fn run(&self, inputs: &PromptInputs) -> Result<RagAnswer, RagError> {
        let docs = self
            .retriever
            .retrieve(&inputs.search_query)
            .await
            .map_err(|e| RagError::Upstream(format!("Kesalahan retrieval: {}", e)))?;
        log::debug!("retrieved {} candidates for '{}'", docs.len(), inputs.search_query);

        let context = format_candidates(&docs);
        let rendered = prompt::render(inputs, &context);

        let raw = self
            .llm
            .complete(&rendered)
            .await
            .map_err(|e| RagError::Upstream(format!("Kesalahan model: {}", e)))?;

        let answer = parsing::parse_answer(&raw)?;
        Ok(answer)
    }
}
