//! Indexing and query pipelines.
//!
//! Both pipelines hold shared capability handles and orchestrate strictly
//! sequential downstream calls. Neither retries: transient provider failures
//! surface to the caller, which owns retry policy. Concurrent invocations
//! share no mutable state beyond the store itself.

use crate::domain::{Document, DocumentStore, StoreError};
use crate::embedding::{EmbeddingClient, EmbeddingClientError};
use crate::summarization::{SummarizationClient, SummarizationClientError};
use std::sync::Arc;
use thiserror::Error;

/// Errors emitted by the indexing and query pipelines.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Query text was missing or blank. Rejected before any provider call.
    #[error("query text must not be empty")]
    EmptyQuery,
    /// Embedding provider failed to produce a vector.
    #[error("Failed to generate embedding: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Vector store rejected an operation.
    #[error("Vector store operation failed: {0}")]
    Store(#[from] StoreError),
    /// Summarization provider failed to produce a summary.
    #[error("Failed to summarize results: {0}")]
    Summarization(#[from] SummarizationClientError),
}

/// Result of a semantic search: one synthesized summary plus per-document sources.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Summary covering all retrieved documents.
    pub summary: String,
    /// One source per retrieved document, in relevance order.
    pub sources: Vec<Source>,
}

/// Attribution entry pointing back at a retrieved document.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    /// Identifier of the source document.
    pub document_id: String,
    /// Excerpt shown alongside the summary.
    pub snippet: String,
}

/// Derive the snippet shown for a retrieved document.
///
/// Currently the full content. Kept as the single extension point for future
/// excerpt extraction so the rest of the query pipeline stays untouched.
fn derive_snippet(content: &str) -> String {
    content.to_string()
}

/// Orchestrates document construction, embedding, and persistence.
pub struct IndexPipeline {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn DocumentStore>,
}

impl IndexPipeline {
    /// Build an indexing pipeline over the given capability handles.
    pub fn new(embedder: Arc<dyn EmbeddingClient>, store: Arc<dyn DocumentStore>) -> Self {
        Self { embedder, store }
    }

    /// Embed `content` and upsert the resulting document under `id`.
    ///
    /// An embedding failure aborts before any write; a document is never
    /// persisted without its embedding.
    pub async fn index(&self, id: &str, content: &str) -> Result<(), PipelineError> {
        let mut doc = Document::new(id, content);
        let embedding = self.embedder.generate(content).await?;
        if embedding.is_empty() {
            return Err(PipelineError::Embedding(
                EmbeddingClientError::InvalidResponse(
                    "provider returned an empty embedding".into(),
                ),
            ));
        }
        doc.attach_embedding(embedding);
        self.store.save(&doc).await?;
        tracing::info!(id = %doc.id, "Document indexed");
        Ok(())
    }
}

/// Orchestrates query embedding, similarity search, summarization, and source assembly.
pub struct QueryPipeline {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn DocumentStore>,
    summarizer: Arc<dyn SummarizationClient>,
}

impl QueryPipeline {
    /// Build a query pipeline over the given capability handles.
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        store: Arc<dyn DocumentStore>,
        summarizer: Arc<dyn SummarizationClient>,
    ) -> Self {
        Self {
            embedder,
            store,
            summarizer,
        }
    }

    /// Answer a natural-language query with a summary and attributed sources.
    ///
    /// Zero search hits is not an error: the summarizer still runs with an
    /// empty passage list and the result carries empty sources.
    pub async fn query(&self, text: &str) -> Result<SearchResult, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyQuery);
        }

        let embedding = self.embedder.generate(text).await?;
        let documents = self.store.search(&embedding).await?;
        tracing::debug!(hits = documents.len(), "Similarity search completed");

        let passages: Vec<String> = documents.iter().map(|doc| doc.content.clone()).collect();
        let summary = self.summarizer.summarize(&passages).await?;

        let sources = documents
            .iter()
            .map(|doc| Source {
                document_id: doc.id.clone(),
                snippet: derive_snippet(&doc.content),
            })
            .collect();

        Ok(SearchResult { summary, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubEmbedder {
        response: Result<Vec<f32>, String>,
        calls: Mutex<Vec<String>>,
    }

    impl StubEmbedder {
        fn returning(embedding: Vec<f32>) -> Self {
            Self {
                response: Ok(embedding),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().expect("lock").len()
        }
    }

    #[async_trait]
    impl EmbeddingClient for StubEmbedder {
        async fn generate(&self, content: &str) -> Result<Vec<f32>, EmbeddingClientError> {
            self.calls.lock().expect("lock").push(content.to_string());
            self.response
                .clone()
                .map_err(EmbeddingClientError::GenerationFailed)
        }
    }

    #[derive(Default)]
    struct StubStore {
        saved: Mutex<Vec<Document>>,
        search_results: Vec<Document>,
    }

    impl StubStore {
        fn with_results(search_results: Vec<Document>) -> Self {
            Self {
                saved: Mutex::new(Vec::new()),
                search_results,
            }
        }

        fn saved_documents(&self) -> Vec<Document> {
            self.saved.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl DocumentStore for StubStore {
        async fn save(&self, doc: &Document) -> Result<(), StoreError> {
            self.saved.lock().expect("lock").push(doc.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &str) -> Result<Document, StoreError> {
            self.saved
                .lock()
                .expect("lock")
                .iter()
                .find(|doc| doc.id == id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(id.to_string()))
        }

        async fn search(&self, _embedding: &[f32]) -> Result<Vec<Document>, StoreError> {
            Ok(self.search_results.clone())
        }
    }

    #[derive(Default)]
    struct StubSummarizer {
        received: Mutex<Vec<Vec<String>>>,
    }

    impl StubSummarizer {
        fn received_passages(&self) -> Vec<Vec<String>> {
            self.received.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl SummarizationClient for StubSummarizer {
        async fn summarize(&self, passages: &[String]) -> Result<String, SummarizationClientError> {
            self.received.lock().expect("lock").push(passages.to_vec());
            Ok(format!("summary of {} passages", passages.len()))
        }
    }

    fn doc(id: &str, content: &str, embedding: Vec<f32>) -> Document {
        let mut doc = Document::new(id, content);
        doc.attach_embedding(embedding);
        doc
    }

    #[tokio::test]
    async fn index_persists_document_with_embedding() {
        let embedder = Arc::new(StubEmbedder::returning(vec![0.1, 0.2, 0.3]));
        let store = Arc::new(StubStore::default());
        let pipeline = IndexPipeline::new(embedder, store.clone());

        pipeline.index("doc-1", "hello world").await.expect("index");

        let saved = store.saved_documents();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, "doc-1");
        assert_eq!(saved[0].content, "hello world");
        assert_eq!(saved[0].embedding.as_deref(), Some([0.1, 0.2, 0.3].as_slice()));

        let found = store.find_by_id("doc-1").await.expect("lookup");
        assert_eq!(found.content, "hello world");
        assert_eq!(found.embedding.map(|e| e.len()), Some(3));
    }

    #[tokio::test]
    async fn index_aborts_without_write_when_embedding_fails() {
        let embedder = Arc::new(StubEmbedder::failing("provider down"));
        let store = Arc::new(StubStore::default());
        let pipeline = IndexPipeline::new(embedder, store.clone());

        let error = pipeline.index("doc-1", "hello").await.expect_err("failure");
        assert!(matches!(error, PipelineError::Embedding(_)));
        assert!(store.saved_documents().is_empty());
    }

    #[tokio::test]
    async fn query_feeds_summarizer_search_contents_in_order() {
        let results = vec![
            doc("a", "first passage", vec![0.9, 0.1]),
            doc("b", "second passage", vec![0.8, 0.2]),
            doc("c", "third passage", vec![0.7, 0.3]),
        ];
        let embedder = Arc::new(StubEmbedder::returning(vec![0.5, 0.5]));
        let store = Arc::new(StubStore::with_results(results));
        let summarizer = Arc::new(StubSummarizer::default());
        let pipeline = QueryPipeline::new(embedder, store, summarizer.clone());

        let result = pipeline.query("what is this about").await.expect("result");

        let received = summarizer.received_passages();
        assert_eq!(received.len(), 1);
        assert_eq!(
            received[0],
            vec![
                "first passage".to_string(),
                "second passage".to_string(),
                "third passage".to_string()
            ]
        );

        assert_eq!(result.summary, "summary of 3 passages");
        assert_eq!(result.sources.len(), 3);
        assert_eq!(result.sources[0].document_id, "a");
        assert_eq!(result.sources[0].snippet, "first passage");
        assert_eq!(result.sources[2].document_id, "c");
    }

    #[tokio::test]
    async fn query_rejects_blank_text_before_embedding() {
        let embedder = Arc::new(StubEmbedder::returning(vec![0.5]));
        let store = Arc::new(StubStore::default());
        let summarizer = Arc::new(StubSummarizer::default());
        let pipeline = QueryPipeline::new(embedder.clone(), store, summarizer);

        let error = pipeline.query("   ").await.expect_err("validation");
        assert!(matches!(error, PipelineError::EmptyQuery));
        assert_eq!(embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn query_with_no_hits_still_invokes_summarizer() {
        let embedder = Arc::new(StubEmbedder::returning(vec![0.5, 0.5]));
        let store = Arc::new(StubStore::with_results(Vec::new()));
        let summarizer = Arc::new(StubSummarizer::default());
        let pipeline = QueryPipeline::new(embedder, store, summarizer.clone());

        let result = pipeline.query("anything").await.expect("result");

        let received = summarizer.received_passages();
        assert_eq!(received.len(), 1);
        assert!(received[0].is_empty());
        assert_eq!(result.summary, "summary of 0 passages");
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn index_rejects_empty_embedding_vector() {
        let embedder = Arc::new(StubEmbedder::returning(Vec::new()));
        let store = Arc::new(StubStore::default());
        let pipeline = IndexPipeline::new(embedder, store.clone());

        let error = pipeline.index("doc-1", "hello").await.expect_err("empty");
        assert!(matches!(
            error,
            PipelineError::Embedding(EmbeddingClientError::InvalidResponse(_))
        ));
        assert!(store.saved_documents().is_empty());
    }
}
