//! Document data model and the vector store capability contract.

use async_trait::async_trait;
use thiserror::Error;

/// A unit of indexed text together with its vector embedding.
///
/// The embedding is absent while the document is in flight through the
/// indexing pipeline; a persisted document always carries one whose length
/// matches the store's declared dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Unique key for upsert semantics; externally assigned or a generated UUID.
    pub id: String,
    /// Raw UTF-8 text, the unit of embedding and retrieval.
    pub content: String,
    /// Embedding vector, `None` until computed.
    pub embedding: Option<Vec<f32>>,
}

impl Document {
    /// Create a document shell without an embedding.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            embedding: None,
        }
    }

    /// Install the embedding produced for this document's content.
    pub fn attach_embedding(&mut self, embedding: Vec<f32>) {
        self.embedding = Some(embedding);
    }
}

/// Errors returned while interacting with the vector store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store base URL failed to parse or normalize.
    #[error("Invalid vector store URL: {0}")]
    InvalidUrl(String),
    /// Backend unreachable or the HTTP layer failed before a response arrived.
    #[error("Vector store unavailable: {0}")]
    Unavailable(String),
    /// Backend responded with an unexpected status code.
    #[error("Unexpected vector store response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the store.
        status: u16,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Backend was reachable but returned a response missing expected fields.
    #[error("Malformed vector store response: {0}")]
    InvalidResponse(String),
    /// Lookup by id found nothing. A normal outcome for point lookups.
    #[error("Document not found: {0}")]
    NotFound(String),
    /// Document embedding does not match the collection schema.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension declared by the collection schema.
        expected: usize,
        /// Dimension carried by the rejected document.
        actual: usize,
    },
    /// Schema readiness could not be established within the retry budget. Fatal at startup.
    #[error("Vector store bootstrap failed after {attempts} attempts: {last_error}")]
    Bootstrap {
        /// Number of readiness attempts made before giving up.
        attempts: usize,
        /// Last error observed during the readiness loop.
        last_error: String,
    },
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Capability contract for persisting and retrieving documents by vector similarity.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create-or-replace a document by id. Rejects embeddings whose length
    /// differs from the collection schema before any write is attempted.
    async fn save(&self, doc: &Document) -> Result<(), StoreError>;

    /// Retrieve a document by id, or [`StoreError::NotFound`].
    async fn find_by_id(&self, id: &str) -> Result<Document, StoreError>;

    /// Return the nearest documents to the query embedding, closest first.
    /// An empty result is a normal outcome, not an error.
    async fn search(&self, embedding: &[f32]) -> Result<Vec<Document>, StoreError>;
}
