use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use validator::Validate;

use crate::nutrition::{
    build_ocr_search_query, build_product_profile, build_search_query, build_user_profile_text,
    build_user_query, NutritionFact, Product, UserProfile,
};
use crate::providers::traits::OcrProvider;
use crate::rag::pipeline::{PromptInputs, RagError, RagPipeline};
use crate::rag::schema::RagAnswer;

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<RagPipeline>,
    ocr: Arc<dyn OcrProvider>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ManualSearchRequest {
    #[serde(default)]
    #[validate(length(max = 500))]
    pub query: Option<String>,
    pub product: Product,
    #[serde(rename = "nutritionFacts", default)]
    pub nutrition_facts: Vec<NutritionFact>,
    #[serde(rename = "userProfile", default)]
    pub user_profile: Option<UserProfile>,
}

#[derive(Serialize)]
pub struct ManualSearchResponse {
    pub status: String,
    pub answer: RagAnswer,
    pub used_query: String,
    pub user_profile: String,
    pub product_profile: String,
}

#[derive(Serialize)]
pub struct OcrSearchResponse {
    pub status: String,
    pub answer: RagAnswer,
    pub ocr_markdown: String,
    pub used_query: String,
    pub user_profile: String,
    pub product_profile: String,
}

#[derive(Serialize)]
struct ErrorBody {
    status: String,
    detail: String,
}

pub struct ApiError(RagError);

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self.0 {
            RagError::Input(msg) => (StatusCode::BAD_REQUEST, msg),
            RagError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            RagError::Schema(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Output model tidak sesuai skema: {}", err),
            ),
        };
        log::warn!("request failed ({}): {}", status, detail);
        (
            status,
            Json(ErrorBody {
                status: "error".to_string(),
                detail,
            }),
        )
            .into_response()
    }
}

pub fn create_api(pipeline: Arc<RagPipeline>, ocr: Arc<dyn OcrProvider>) -> Router {
    let state = AppState { pipeline, ocr };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/search/manual", post(manual_search))
        .route("/search/ocr", post(ocr_search))
        // Label photos are routinely larger than the 2 MB default
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "hello from grains-api" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK" }))
}

/// Precondition plus context building for the manual variant. Rejects before
/// anything is sent upstream.
fn manual_inputs(payload: &ManualSearchRequest) -> Result<PromptInputs, RagError> {
    payload
        .validate()
        .map_err(|e| RagError::Input(format!("Permintaan tidak valid: {}", e)))?;

    let query = payload
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());
    let product_name = payload
        .product
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    if query.is_none() && product_name.is_none() && payload.nutrition_facts.is_empty() {
        return Err(RagError::Input(
            "Field query, product.name, atau nutritionFacts harus diisi.".to_string(),
        ));
    }

    let user = payload.user_profile.as_ref();
    Ok(PromptInputs {
        search_query: build_search_query(query, product_name, &payload.nutrition_facts),
        user_query: build_user_query(user.and_then(|u| u.medical_history.as_deref())),
        user_profile: build_user_profile_text(user),
        product_profile: build_product_profile(&payload.product, &payload.nutrition_facts),
    })
}

async fn execute_manual(
    pipeline: &RagPipeline,
    payload: &ManualSearchRequest,
) -> Result<ManualSearchResponse, RagError> {
    let inputs = manual_inputs(payload)?;
    let answer = pipeline.run(&inputs).await?;
    Ok(ManualSearchResponse {
        status: "ok".to_string(),
        answer,
        used_query: inputs.search_query,
        user_profile: inputs.user_profile,
        product_profile: inputs.product_profile,
    })
}

async fn manual_search(
    State(state): State<AppState>,
    Json(payload): Json<ManualSearchRequest>,
) -> Result<Json<ManualSearchResponse>, ApiError> {
    let response = execute_manual(&state.pipeline, &payload).await?;
    Ok(Json(response))
}

/// Concatenate page texts, skipping pages OCR left empty. `None` when nothing
/// readable came back.
fn join_ocr_pages(pages: &[String]) -> Option<String> {
    let non_empty: Vec<&str> = pages
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if non_empty.is_empty() {
        None
    } else {
        Some(non_empty.join("\n\n"))
    }
}

fn ocr_inputs(markdown: &str, user: Option<&UserProfile>) -> PromptInputs {
    PromptInputs {
        search_query: build_ocr_search_query(markdown),
        user_query: build_user_query(user.and_then(|u| u.medical_history.as_deref())),
        user_profile: build_user_profile_text(user),
        product_profile: format!("OCR result:\n{}", markdown),
    }
}

async fn ocr_search(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<OcrSearchResponse>, ApiError> {
    let mut image: Option<(Vec<u8>, String)> = None;
    let mut user_profile_raw: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RagError::Input(format!("Gagal membaca form: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("image") => {
                let mime = field
                    .content_type()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "image/jpeg".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| RagError::Input(format!("Gagal membaca gambar: {}", e)))?;
                image = Some((data.to_vec(), mime));
            }
            Some("userProfile") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| RagError::Input(format!("userProfile tidak valid: {}", e)))?;
                user_profile_raw = Some(text);
            }
            _ => {}
        }
    }

    let (data, mime) =
        image.ok_or_else(|| RagError::Input("File gambar tidak ditemukan.".to_string()))?;
    if data.is_empty() {
        return Err(RagError::Input("File gambar kosong.".to_string()).into());
    }

    let parsed_user: Option<UserProfile> = match user_profile_raw.filter(|s| !s.trim().is_empty())
    {
        Some(raw) => Some(
            serde_json::from_str(&raw)
                .map_err(|e| RagError::Input(format!("userProfile tidak valid: {}", e)))?,
        ),
        None => None,
    };

    let pages = state
        .ocr
        .extract_pages(&data, &mime)
        .await
        .map_err(|e| RagError::Upstream(format!("Kesalahan OCR: {}", e)))?;
    let markdown = join_ocr_pages(&pages)
        .ok_or_else(|| RagError::Upstream("Hasil OCR kosong.".to_string()))?;

    let inputs = ocr_inputs(&markdown, parsed_user.as_ref());
    let answer = state.pipeline.run(&inputs).await?;

    Ok(Json(OcrSearchResponse {
        status: "ok".to_string(),
        answer,
        ocr_markdown: markdown,
        used_query: inputs.search_query,
        user_profile: inputs.user_profile,
        product_profile: inputs.product_profile,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::vector_db::CandidateDocument;
    use crate::nutrition::Portion;
    use crate::providers::traits::{CompletionProvider, Retriever};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRetriever {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Retriever for CountingRetriever {
        async fn retrieve(&self, _query: &str) -> anyhow::Result<Vec<CandidateDocument>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    struct CountingLlm {
        calls: AtomicUsize,
        reply: String,
    }

    #[async_trait]
    impl CompletionProvider for CountingLlm {
        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }

        async fn generate_embedding(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            Ok(vec![0.0; 4])
        }

        fn model_info(&self) -> String {
            "fake".to_string()
        }
    }

    const NO_ALTERNATIVE_ANSWER: &str = r#"{
        "product_assessment": {
            "product_type": "minuman",
            "is_safe": true,
            "reasons": ["gula rendah"],
            "summary": "Aman."
        },
        "recommendations": [],
        "summary": "Tidak ada alternatif yang sesuai."
    }"#;

    fn empty_request() -> ManualSearchRequest {
        ManualSearchRequest {
            query: Some("   ".to_string()),
            product: Product {
                name: None,
                portion: Portion {
                    size: None,
                    unit: "botol".to_string(),
                },
            },
            nutrition_facts: vec![],
            user_profile: None,
        }
    }

    #[tokio::test]
    async fn manual_precondition_rejects_before_any_remote_call() {
        let retriever = Arc::new(CountingRetriever {
            calls: AtomicUsize::new(0),
        });
        let llm = Arc::new(CountingLlm {
            calls: AtomicUsize::new(0),
            reply: NO_ALTERNATIVE_ANSWER.to_string(),
        });
        let pipeline = RagPipeline::new(retriever.clone(), llm.clone());

        let result = execute_manual(&pipeline, &empty_request()).await;

        assert!(matches!(result, Err(RagError::Input(_))));
        assert_eq!(retriever.calls.load(Ordering::SeqCst), 0);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn manual_search_returns_built_context_texts() {
        let retriever = Arc::new(CountingRetriever {
            calls: AtomicUsize::new(0),
        });
        let llm = Arc::new(CountingLlm {
            calls: AtomicUsize::new(0),
            reply: NO_ALTERNATIVE_ANSWER.to_string(),
        });
        let pipeline = RagPipeline::new(retriever, llm);

        let mut payload = empty_request();
        payload.product.name = Some("Teh Manis".to_string());
        payload.nutrition_facts = vec![NutritionFact {
            label: Some("Gula".to_string()),
            value: Some("27 g".to_string()),
        }];

        let response = execute_manual(&pipeline, &payload)
            .await
            .expect("manual search should succeed");

        assert_eq!(response.status, "ok");
        assert_eq!(response.used_query, "Teh Manis ; Gula 27 g");
        assert_eq!(
            response.user_profile,
            "No user profile data available. Use general assumptions and provide safe recommendations."
        );
        assert!(response
            .product_profile
            .contains("Serving size: botol (amount not provided)"));
    }

    #[test]
    fn ocr_pages_skip_empty_entries() {
        let pages = vec![String::new(), "Teh Manis 350ml\nGula 27g".to_string()];
        assert_eq!(
            join_ocr_pages(&pages).as_deref(),
            Some("Teh Manis 350ml\nGula 27g")
        );
        assert_eq!(join_ocr_pages(&[String::new()]), None);
        assert_eq!(join_ocr_pages(&[]), None);
    }

    #[test]
    fn ocr_inputs_carry_markdown_under_heading() {
        let markdown = "Teh Manis 350ml\nGula 27g";
        let inputs = ocr_inputs(markdown, None);

        assert_eq!(inputs.search_query, "Teh Manis 350ml Gula 27g");
        assert_eq!(inputs.product_profile, "OCR result:\nTeh Manis 350ml\nGula 27g");
    }

    #[test]
    fn strict_request_rejects_unknown_fields() {
        let result: Result<ManualSearchRequest, _> = serde_json::from_value(serde_json::json!({
            "product": { "name": "Teh", "portion": { "size": null, "unit": "botol" } },
            "nutritionFacts": [],
            "extra": true
        }));
        assert!(result.is_err());
    }
}
