use crate::database::vector_db::CandidateDocument;
use anyhow::Result;
use async_trait::async_trait;

/// Chat-completion and embedding calls against a hosted model. Implementors
/// must be safe to share across concurrent requests behind an `Arc`.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>>;

    fn model_info(&self) -> String;
}

/// OCR over an uploaded image; returns one text block per page, in page
/// order. Pages with no extracted text come back as empty strings.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    async fn extract_pages(&self, image: &[u8], mime: &str) -> Result<Vec<String>>;
}

/// Similarity search over the candidate-product store. K is fixed by the
/// implementation, not the caller.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<CandidateDocument>>;
}
