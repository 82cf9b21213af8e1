// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI Chat Completions API.
//!
//! Provides [`OpenAiClient`] which handles request construction,
//! authentication, streaming SSE responses, and transient error retry.

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use leadflow_core::LeadflowError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::sse::{self, StreamEvent};
use crate::types::{ApiErrorResponse, ChatRequest};

/// HTTP client for OpenAI API communication.
///
/// Manages authentication headers, connection pooling, and retry logic
/// for transient errors (429, 500, 503).
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl OpenAiClient {
    /// Creates a new OpenAI API client.
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API key for authentication
    /// * `base_url` - API base (e.g., "https://api.openai.com/v1")
    pub fn new(api_key: String, base_url: String) -> Result<Self, LeadflowError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {api_key}");
        headers.insert(
            "authorization",
            HeaderValue::from_str(&bearer).map_err(|e| {
                LeadflowError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LeadflowError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Sends a streaming request and returns a stream of SSE events.
    ///
    /// On transient errors (429, 500, 503), retries once after a 1-second delay.
    pub async fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent, LeadflowError>> + Send>>, LeadflowError>
    {
        let mut req = request.clone();
        req.stream = true;

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying streaming request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(self.completions_url())
                .json(&req)
                .send()
                .await
                .map_err(|e| LeadflowError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "streaming response received");

            if status.is_success() {
                return Ok(sse::parse_sse_stream(response));
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(LeadflowError::Provider {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            // Non-transient error or exhausted retries.
            let body = response.text().await.unwrap_or_default();
            let error_msg = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body)
            {
                format!(
                    "OpenAI API error ({}): {}",
                    api_err.error.type_.as_deref().unwrap_or("unknown"),
                    api_err.error.message
                )
            } else {
                format!("API returned {status}: {body}")
            };
            return Err(LeadflowError::Provider {
                message: error_msg,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| LeadflowError::Provider {
            message: "streaming request failed after retries".into(),
            source: None,
        }))
    }
}

/// Transient HTTP statuses worth one retry.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessagePayload;
    use futures::StreamExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4.1-mini".into(),
            messages: vec![ChatMessagePayload::user("hello")],
            max_tokens: Some(64),
            stream: true,
        }
    }

    #[tokio::test]
    async fn stream_chat_parses_successful_response() {
        let server = MockServer::start().await;
        let sse = concat!(
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi!\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new("test-key".into(), server.uri()).unwrap();
        let events: Vec<_> = client
            .stream_chat(&make_request())
            .await
            .unwrap()
            .map(|e| e.unwrap())
            .collect()
            .await;

        assert_eq!(
            events,
            vec![StreamEvent::Delta("Hi!".into()), StreamEvent::Done]
        );
    }

    #[tokio::test]
    async fn transient_error_is_retried_once() {
        let server = MockServer::start().await;
        let sse = "data: [DONE]\n\n";

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new("test-key".into(), server.uri()).unwrap();
        let events: Vec<_> = client
            .stream_chat(&make_request())
            .await
            .unwrap()
            .map(|e| e.unwrap())
            .collect()
            .await;
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[tokio::test]
    async fn auth_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string(
                r#"{"error":{"message":"Incorrect API key","type":"invalid_request_error"}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new("bad-key".into(), server.uri()).unwrap();
        let err = client.stream_chat(&make_request()).await.err().unwrap();
        assert!(err.to_string().contains("Incorrect API key"));
    }

    #[test]
    fn transient_statuses() {
        assert!(is_transient_error(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_error(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert!(is_transient_error(reqwest::StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_transient_error(reqwest::StatusCode::UNAUTHORIZED));
    }
}
