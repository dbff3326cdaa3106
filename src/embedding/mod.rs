//! Embedding client abstraction and the Google Generative Language adapter.
//!
//! The adapter issues HTTP requests directly against the `embedContent`
//! endpoint rather than pulling in a provider SDK, mirroring how the store
//! adapter talks to Typesense.

use crate::config::get_config;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

const DEFAULT_GOOGLE_AI_URL: &str = "https://generativelanguage.googleapis.com";

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// Provider unreachable or the HTTP layer failed before a response arrived.
    #[error("Embedding provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate embedding: {0}")]
    GenerationFailed(String),
    /// Provider response was missing the expected embedding values.
    #[error("Malformed embedding response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by embedding backends.
///
/// A non-error return always carries a non-empty vector; providers must map
/// an empty upstream payload to [`EmbeddingClientError::InvalidResponse`]
/// instead of handing back a zero-length embedding.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce an embedding vector for the supplied text.
    async fn generate(&self, content: &str) -> Result<Vec<f32>, EmbeddingClientError>;
}

/// Embedding client backed by the Google Generative Language API.
pub struct GoogleEmbeddingClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) model: String,
}

impl GoogleEmbeddingClient {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Self {
        let config = get_config();
        let http = Client::builder()
            .user_agent("semsearch/0.1")
            .build()
            .expect("Failed to construct reqwest::Client for embeddings");
        Self {
            http,
            base_url: DEFAULT_GOOGLE_AI_URL.to_string(),
            api_key: config.google_api_key.clone(),
            model: config.embedding_model.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:embedContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl Default for GoogleEmbeddingClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    #[serde(default)]
    embedding: Option<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[async_trait]
impl EmbeddingClient for GoogleEmbeddingClient {
    async fn generate(&self, content: &str) -> Result<Vec<f32>, EmbeddingClientError> {
        let payload = json!({
            "model": format!("models/{}", self.model),
            "content": { "parts": [ { "text": content } ] },
        });

        let mut request = self.http.post(self.endpoint()).json(&payload);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            request = request.query(&[("key", api_key)]);
        }

        let response = request.send().await.map_err(|error| {
            EmbeddingClientError::ProviderUnavailable(format!(
                "failed to reach embedding provider at {}: {error}",
                self.base_url
            ))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingClientError::GenerationFailed(format!(
                "provider returned {status}: {body}"
            )));
        }

        let body: EmbedContentResponse = response.json().await.map_err(|error| {
            EmbeddingClientError::InvalidResponse(format!(
                "failed to decode embedding response: {error}"
            ))
        })?;

        let values = body
            .embedding
            .map(|embedding| embedding.values)
            .unwrap_or_default();
        if values.is_empty() {
            return Err(EmbeddingClientError::InvalidResponse(
                "received an empty embedding from the provider".into(),
            ));
        }

        Ok(values)
    }
}
