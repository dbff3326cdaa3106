//! HTTP client wrapper for interacting with Typesense.
//!
//! The client owns the bootstrap protocol for the `documents` collection.
//! Bootstrap is deliberately destructive: an existing collection is dropped
//! and recreated so the schema always matches this build. That only runs at
//! startup, never per request.

use crate::config::get_config;
use crate::domain::{Document, DocumentStore, StoreError};
use crate::typesense::types::{DocumentRecord, SearchResponse};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::json;
use std::time::Duration;

/// Number of nearest neighbors requested from every similarity search.
pub const SEARCH_TOP_K: usize = 10;

const COLLECTION_NAME: &str = "documents";
const READY_ATTEMPTS: usize = 30;
const READY_INTERVAL: Duration = Duration::from_secs(2);

/// Lightweight HTTP client for Typesense operations.
pub struct TypesenseClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) dimension: usize,
}

impl TypesenseClient {
    /// Construct a new client using configuration derived from the environment.
    ///
    /// No network traffic happens here; use [`TypesenseClient::connect`] to
    /// establish readiness before serving requests.
    pub fn new() -> Result<Self, StoreError> {
        let config = get_config();
        Self::with_endpoint(
            format!("http://{}:{}", config.typesense_host, config.typesense_port),
            config.typesense_api_key.clone(),
            config.embedding_dimension,
        )
    }

    fn with_endpoint(
        base_url: String,
        api_key: Option<String>,
        dimension: usize,
    ) -> Result<Self, StoreError> {
        let parsed =
            reqwest::Url::parse(&base_url).map_err(|err| StoreError::InvalidUrl(err.to_string()))?;
        let http = Client::builder().user_agent("semsearch/0.1").build()?;
        tracing::debug!(
            url = %parsed,
            has_api_key = api_key.as_deref().map(|value| !value.is_empty()).unwrap_or(false),
            dimension,
            "Initialized Typesense HTTP client"
        );
        Ok(Self {
            http,
            base_url: parsed.to_string().trim_end_matches('/').to_string(),
            api_key,
            dimension,
        })
    }

    /// Construct a client and block until the backing collection is ready.
    ///
    /// Readiness is attempted up to 30 times at a fixed 2-second interval to
    /// absorb Typesense's own startup latency. Exhausting the budget is fatal;
    /// the server must not accept traffic against an unverified schema. This
    /// is the only retry loop in the crate.
    pub async fn connect() -> Result<Self, StoreError> {
        let store = Self::new()?;
        let mut last_error = String::new();
        for attempt in 1..=READY_ATTEMPTS {
            match store.ensure_ready().await {
                Ok(()) => {
                    tracing::info!(attempt, collection = COLLECTION_NAME, "Vector store ready");
                    return Ok(store);
                }
                Err(error) => {
                    last_error = error.to_string();
                    tracing::debug!(attempt, error = %last_error, "Vector store not ready yet");
                    if attempt < READY_ATTEMPTS {
                        tokio::time::sleep(READY_INTERVAL).await;
                    }
                }
            }
        }
        Err(StoreError::Bootstrap {
            attempts: READY_ATTEMPTS,
            last_error,
        })
    }

    /// Verify the `documents` collection exists with the expected schema.
    ///
    /// An existing collection is dropped and recreated so the schema is
    /// guaranteed to match the configured embedding dimension. A creation
    /// conflict raised by a racing process is treated as success.
    pub async fn ensure_ready(&self) -> Result<(), StoreError> {
        let response = self
            .request(Method::GET, &format!("collections/{COLLECTION_NAME}"))
            .send()
            .await?;
        match response.status() {
            StatusCode::OK => {
                let deleted = self
                    .request(Method::DELETE, &format!("collections/{COLLECTION_NAME}"))
                    .send()
                    .await?;
                if !deleted.status().is_success() {
                    tracing::warn!(
                        status = deleted.status().as_u16(),
                        "Failed to drop existing collection before recreation"
                    );
                }
            }
            StatusCode::NOT_FOUND => {}
            status => {
                let body = response.text().await.unwrap_or_default();
                return Err(StoreError::UnexpectedStatus {
                    status: status.as_u16(),
                    body,
                });
            }
        }

        let schema = json!({
            "name": COLLECTION_NAME,
            "fields": [
                { "name": "id", "type": "string" },
                { "name": "content", "type": "string" },
                {
                    "name": "embedding",
                    "type": "float[]",
                    "index": true,
                    "optional": true,
                    "num_dim": self.dimension,
                },
            ],
        });
        let response = self
            .request(Method::POST, "collections")
            .json(&schema)
            .send()
            .await?;
        if response.status().is_success() {
            tracing::debug!(collection = COLLECTION_NAME, "Collection created");
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT || body.contains("already exists") {
            tracing::debug!(
                collection = COLLECTION_NAME,
                "Collection created by a concurrent process"
            );
            return Ok(());
        }
        Err(StoreError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut req = self.http.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.header("X-TYPESENSE-API-KEY", api_key);
        }
        req
    }
}

#[async_trait]
impl DocumentStore for TypesenseClient {
    async fn save(&self, doc: &Document) -> Result<(), StoreError> {
        let embedding = doc.embedding.as_deref().unwrap_or(&[]);
        if embedding.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        let record = DocumentRecord {
            id: doc.id.clone(),
            content: doc.content.clone(),
            embedding: embedding.to_vec(),
        };
        let response = self
            .request(
                Method::POST,
                &format!("collections/{COLLECTION_NAME}/documents"),
            )
            .query(&[("action", "upsert")])
            .json(&record)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::debug!(id = %doc.id, "Document upserted");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StoreError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            };
            tracing::error!(id = %doc.id, error = %error, "Typesense upsert failed");
            Err(error)
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Document, StoreError> {
        let response = self
            .request(
                Method::GET,
                &format!("collections/{COLLECTION_NAME}/documents/{id}"),
            )
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let record: DocumentRecord = response
                    .json()
                    .await
                    .map_err(|err| StoreError::InvalidResponse(err.to_string()))?;
                Ok(record.into_document())
            }
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(id.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::UnexpectedStatus {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    async fn search(&self, embedding: &[f32]) -> Result<Vec<Document>, StoreError> {
        let vector_query = format_vector_query(embedding, SEARCH_TOP_K);
        let response = self
            .request(
                Method::GET,
                &format!("collections/{COLLECTION_NAME}/documents/search"),
            )
            .query(&[
                ("q", "*"),
                ("query_by", "content"),
                ("vector_query", vector_query.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StoreError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            };
            tracing::error!(error = %error, "Typesense search failed");
            return Err(error);
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|err| StoreError::InvalidResponse(err.to_string()))?;
        let documents = payload
            .hits
            .into_iter()
            .map(|hit| hit.document.into_document())
            .collect();
        Ok(documents)
    }
}

fn format_vector_query(embedding: &[f32], k: usize) -> String {
    let values = embedding
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("embedding:([{values}], k:{k})")
}
