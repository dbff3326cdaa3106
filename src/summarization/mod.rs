//! Summarization client abstraction and the Google Generative Language adapter.
//!
//! The prompt template is an adapter-internal detail; callers only hand over
//! the ordered passages retrieved for a query.

use crate::config::get_config;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

const DEFAULT_GOOGLE_AI_URL: &str = "https://generativelanguage.googleapis.com";

/// Errors surfaced while attempting summarization.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Provider unreachable or the HTTP layer failed before a response arrived.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed or carried no usable text.
    #[error("Malformed summarization response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by summarization backends.
///
/// An empty summary is never a success; providers must map a response with no
/// candidates or no text parts to [`SummarizationClientError::InvalidResponse`].
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Synthesize a single summary covering the supplied passages, in order.
    async fn summarize(&self, passages: &[String]) -> Result<String, SummarizationClientError>;
}

/// Summarization client backed by the Google Generative Language API.
pub struct GoogleSummarizationClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) model: String,
}

impl GoogleSummarizationClient {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Self {
        let config = get_config();
        let http = Client::builder()
            .user_agent("semsearch/0.1")
            .build()
            .expect("Failed to construct reqwest::Client for summarization");
        Self {
            http,
            base_url: DEFAULT_GOOGLE_AI_URL.to_string(),
            api_key: config.google_api_key.clone(),
            model: config.summarization_model.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn build_prompt(passages: &[String]) -> String {
        format!(
            "Provide a concise summary of the following documents:\n\n{}",
            passages.join("\n---\n")
        )
    }
}

impl Default for GoogleSummarizationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl SummarizationClient for GoogleSummarizationClient {
    async fn summarize(&self, passages: &[String]) -> Result<String, SummarizationClientError> {
        let payload = json!({
            "contents": [ { "parts": [ { "text": Self::build_prompt(passages) } ] } ],
        });

        let mut request = self.http.post(self.endpoint()).json(&payload);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            request = request.query(&[("key", api_key)]);
        }

        let response = request.send().await.map_err(|error| {
            SummarizationClientError::ProviderUnavailable(format!(
                "failed to reach summarization provider at {}: {error}",
                self.base_url
            ))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::GenerationFailed(format!(
                "provider returned {status}: {body}"
            )));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode summarization response: {error}"
            ))
        })?;

        if body.candidates.is_empty() {
            return Err(SummarizationClientError::InvalidResponse(
                "received an empty candidate list from the provider".into(),
            ));
        }

        let mut summary = String::new();
        for candidate in body.candidates {
            if let Some(content) = candidate.content {
                for part in content.parts {
                    if let Some(text) = part.text {
                        summary.push_str(&text);
                    }
                }
            }
        }

        if summary.is_empty() {
            return Err(SummarizationClientError::InvalidResponse(
                "no text part found in provider response".into(),
            ));
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn test_client(base_url: String) -> GoogleSummarizationClient {
        GoogleSummarizationClient {
            http: Client::builder()
                .user_agent("semsearch-test")
                .build()
                .expect("client"),
            base_url,
            api_key: None,
            model: "gemini-pro".into(),
        }
    }

    #[tokio::test]
    async fn summarize_concatenates_text_parts() {
        let server = MockServer::start_async().await;
        let client = test_client(server.base_url());

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-pro:generateContent");
                then.status(200).json_body(json!({
                    "candidates": [
                        { "content": { "parts": [ { "text": "Summary " }, { "text": "text" } ] } }
                    ]
                }));
            })
            .await;

        let summary = client
            .summarize(&["first passage".into(), "second passage".into()])
            .await
            .expect("summary");

        mock.assert();
        assert_eq!(summary, "Summary text");
    }

    #[tokio::test]
    async fn summarize_rejects_empty_candidate_list() {
        let server = MockServer::start_async().await;
        let client = test_client(server.base_url());

        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-pro:generateContent");
                then.status(200).json_body(json!({ "candidates": [] }));
            })
            .await;

        let error = client
            .summarize(&["passage".into()])
            .await
            .expect_err("empty candidates");
        assert!(matches!(error, SummarizationClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn summarize_rejects_response_without_text_parts() {
        let server = MockServer::start_async().await;
        let client = test_client(server.base_url());

        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-pro:generateContent");
                then.status(200).json_body(json!({
                    "candidates": [ { "content": { "parts": [] } } ]
                }));
            })
            .await;

        let error = client
            .summarize(&["passage".into()])
            .await
            .expect_err("no text parts");
        assert!(matches!(error, SummarizationClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn summarize_surfaces_error_status() {
        let server = MockServer::start_async().await;
        let client = test_client(server.base_url());

        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-pro:generateContent");
                then.status(500).body("boom");
            })
            .await;

        let error = client
            .summarize(&["passage".into()])
            .await
            .expect_err("error response");
        assert!(
            matches!(error, SummarizationClientError::GenerationFailed(message) if message.contains("500"))
        );
    }
}
