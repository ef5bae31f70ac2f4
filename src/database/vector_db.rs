use qdrant_client::config::QdrantConfig;
use qdrant_client::qdrant::{
    with_payload_selector::SelectorOptions, SearchPoints, WithPayloadSelector,
};
use qdrant_client::Qdrant;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorDBError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Operation failed: {0}")]
    Operation(String),
}

/// One retrieved candidate product: the indexed snippet plus whatever
/// structured metadata was stored alongside it.
#[derive(Debug, Clone)]
pub struct CandidateDocument {
    pub text: String,
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Clone)]
pub struct VectorDB {
    client: Arc<Qdrant>,
}

/// Qdrant speaks gRPC on 6334; accept the REST port and scheme-less URLs too.
fn grpc_url(url: &str) -> String {
    let without_scheme = url.split("://").last().unwrap_or(url);
    let host = if without_scheme.ends_with(":6333") {
        without_scheme.replace(":6333", ":6334")
    } else {
        without_scheme.to_string()
    };
    format!("http://{}", host)
}

impl VectorDB {
    pub async fn new(url: &str) -> Result<Self, VectorDBError> {
        let endpoint = grpc_url(url);
        log::info!("Connecting to Qdrant at {}", endpoint);

        let mut config = QdrantConfig::from_url(&endpoint);
        config.check_compatibility = false;
        config.timeout = Duration::from_secs(30);
        config.connect_timeout = Duration::from_secs(10);

        let client = Qdrant::new(config).map_err(|e| VectorDBError::Connection(e.to_string()))?;

        // Ping so bad settings fail at startup, not on the first request
        client
            .list_collections()
            .await
            .map_err(|e| VectorDBError::Connection(format!("Failed to connect to Qdrant: {}", e)))?;
        log::info!("Successfully connected to Qdrant");

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// K nearest neighbours by the collection's configured distance (cosine),
    /// mapped into `CandidateDocument`s. The `text` payload key is the
    /// snippet; every other key becomes metadata.
    pub async fn search_vectors(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<CandidateDocument>, VectorDBError> {
        let request = SearchPoints {
            collection_name: collection.to_string(),
            vector: query_vector,
            limit,
            with_payload: Some(WithPayloadSelector {
                selector_options: Some(SelectorOptions::Enable(true)),
            }),
            ..Default::default()
        };

        let results = self
            .client
            .search_points(request)
            .await
            .map_err(|e| VectorDBError::Operation(e.to_string()))?;

        let documents = results
            .result
            .into_iter()
            .map(|point| {
                let mut metadata: HashMap<String, serde_json::Value> = point
                    .payload
                    .into_iter()
                    .map(|(k, v)| {
                        (
                            k,
                            serde_json::Value::try_from(v).unwrap_or(serde_json::Value::Null),
                        )
                    })
                    .collect();

                let text = metadata
                    .remove("text")
                    .and_then(|v| v.as_str().map(|s| s.to_string()))
                    .unwrap_or_default();

                CandidateDocument { text, metadata }
            })
            .collect();

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grpc_url_swaps_rest_port_and_strips_scheme() {
        assert_eq!(grpc_url("http://localhost:6333"), "http://localhost:6334");
        assert_eq!(grpc_url("localhost:6334"), "http://localhost:6334");
        assert_eq!(grpc_url("https://qdrant.internal:6333"), "http://qdrant.internal:6334");
    }
}
