//! HTTP surface for semsearch.
//!
//! A compact Axum router with three endpoints:
//!
//! - `POST /api/v1/documents` – Index a document supplied as JSON (`{id?, content}`)
//!   or as a multipart form (`file` field, optional `id` value). Returns 202 with an
//!   empty body; a missing id is generated server-side.
//! - `GET /api/v1/search?q=<text>` – Embed the query, retrieve similar documents, and
//!   return a synthesized summary with per-document sources.
//! - `GET /health` – Liveness only, no dependency checks.
//!
//! Failures map to coarse status codes; upstream provider error bodies go to the
//! logs, never to clients.

use crate::pipeline::{IndexPipeline, PipelineError, QueryPipeline, SearchResult};
use axum::{
    Json, Router,
    body::to_bytes,
    extract::{FromRequest, Multipart, Query, Request, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared handler state: both pipelines wired over the same capability handles.
pub struct AppState {
    /// Pipeline backing `POST /api/v1/documents`.
    pub indexer: IndexPipeline,
    /// Pipeline backing `GET /api/v1/search`.
    pub searcher: QueryPipeline,
}

/// Build the HTTP router exposing the document and search API surface.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/documents", post(index_document))
        .route("/api/v1/search", get(search_documents))
        .route("/health", get(health))
        .with_state(state)
}

/// Request body for the JSON form of `POST /api/v1/documents`.
#[derive(Deserialize)]
struct IndexDocumentRequest {
    /// Optional document identifier; generated when absent.
    #[serde(default)]
    id: Option<String>,
    /// Raw document contents to index.
    content: String,
}

async fn index_document(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<StatusCode, AppError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    let (id, content) = if content_type.starts_with("application/json") {
        let bytes = to_bytes(request.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|_| AppError::BadRequest("invalid request body"))?;
        let body: IndexDocumentRequest = serde_json::from_slice(&bytes)
            .map_err(|_| AppError::BadRequest("invalid request body"))?;
        (body.id, body.content)
    } else if content_type.starts_with("multipart/form-data") {
        read_multipart(request).await?
    } else {
        return Err(AppError::UnsupportedContentType);
    };

    let id = match id.filter(|value| !value.trim().is_empty()) {
        Some(id) => id,
        None => Uuid::new_v4().to_string(),
    };

    state.indexer.index(&id, &content).await?;
    Ok(StatusCode::ACCEPTED)
}

async fn read_multipart(request: Request) -> Result<(Option<String>, String), AppError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|_| AppError::BadRequest("invalid multipart body"))?;

    let mut id = None;
    let mut content = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("invalid multipart body"))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                content = Some(
                    field
                        .text()
                        .await
                        .map_err(|_| AppError::BadRequest("failed to read file field"))?,
                );
            }
            Some("id") => {
                id = Some(
                    field
                        .text()
                        .await
                        .map_err(|_| AppError::BadRequest("failed to read id field"))?,
                );
            }
            _ => {}
        }
    }

    let content = content.ok_or(AppError::BadRequest("missing file field"))?;
    Ok((id, content))
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: Option<String>,
}

/// Response body for `GET /api/v1/search`. Field names are part of the wire
/// contract inherited from the original service.
#[derive(Serialize)]
struct SearchResponseBody {
    #[serde(rename = "Summary")]
    summary: String,
    #[serde(rename = "Sources")]
    sources: Vec<SourceBody>,
}

#[derive(Serialize)]
struct SourceBody {
    #[serde(rename = "DocumentID")]
    document_id: String,
    #[serde(rename = "Snippet")]
    snippet: String,
}

impl From<SearchResult> for SearchResponseBody {
    fn from(result: SearchResult) -> Self {
        Self {
            summary: result.summary,
            sources: result
                .sources
                .into_iter()
                .map(|source| SourceBody {
                    document_id: source.document_id,
                    snippet: source.snippet,
                })
                .collect(),
        }
    }
}

async fn search_documents(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponseBody>, AppError> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(AppError::BadRequest("missing query parameter 'q'"));
    }

    let result = state.searcher.query(&query).await?;
    Ok(Json(SearchResponseBody::from(result)))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

enum AppError {
    BadRequest(&'static str),
    UnsupportedContentType,
    Pipeline(PipelineError),
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self::Pipeline(inner)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::UnsupportedContentType => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported content type").into_response()
            }
            Self::Pipeline(PipelineError::EmptyQuery) => {
                (StatusCode::BAD_REQUEST, "query text must not be empty").into_response()
            }
            Self::Pipeline(error) => {
                tracing::error!(error = %error, "Pipeline request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "request failed").into_response()
            }
        }
    }
}
