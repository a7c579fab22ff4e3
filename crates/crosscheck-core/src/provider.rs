//! Completion backends for the remote model providers.
//!
//! Each backend turns a [`CompletionRequest`] into one HTTP call and returns
//! the raw text the model produced. Backends never retry and never interpret
//! the text; parsing and validation belong to the tool adapters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::CrossCheckError;
use crate::prompts::Prompt;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Sampling temperature used for every review call.
pub const REVIEW_TEMPERATURE: f64 = 0.3;

/// One chat/generation request with JSON output requested.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: Prompt,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

/// A remote model API.
///
/// `credential` is whatever the provider authenticates with: an API key for
/// Gemini, a bearer access token for OpenAI.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Provider name (e.g., "gemini", "openai").
    fn name(&self) -> &str;

    async fn complete(
        &self,
        credential: &str,
        request: &CompletionRequest,
    ) -> Result<String, CrossCheckError>;
}

// ---------------------------------------------------------------------------
// Gemini
// ---------------------------------------------------------------------------

/// Backend for the Google Gemini generateContent API.
pub struct GeminiBackend {
    base_url: String,
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

impl Default for GeminiBackend {
    fn default() -> Self {
        Self::new(DEFAULT_GEMINI_BASE_URL)
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(
        &self,
        credential: &str,
        request: &CompletionRequest,
    ) -> Result<String, CrossCheckError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, request.model
        );

        let body = serde_json::json!({
            "systemInstruction": {
                "parts": [{"text": request.prompt.system}]
            },
            "contents": [
                {"role": "user", "parts": [{"text": request.prompt.user}]}
            ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "temperature": request.temperature,
                "maxOutputTokens": request.max_output_tokens
            }
        });

        tracing::debug!(model = %request.model, "sending Gemini generateContent request");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", credential)
            .json(&body)
            .send()
            .await
            .map_err(CrossCheckError::provider_transport)?;

        let json = read_success_json(response).await?;

        let parts = json["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| {
                CrossCheckError::MalformedProviderResponse("No candidates in Gemini response".into())
            })?;
        let text: String = parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect();

        if text.is_empty() {
            return Err(CrossCheckError::MalformedProviderResponse(
                "No text in Gemini response".into(),
            ));
        }
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// OpenAI
// ---------------------------------------------------------------------------

/// Backend for the OpenAI Chat Completions API.
pub struct OpenAiBackend {
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

impl Default for OpenAiBackend {
    fn default() -> Self {
        Self::new(DEFAULT_OPENAI_BASE_URL)
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        credential: &str,
        request: &CompletionRequest,
    ) -> Result<String, CrossCheckError> {
        let body = serde_json::json!({
            "model": request.model,
            "messages": [
                {"role": "system", "content": request.prompt.system},
                {"role": "user", "content": request.prompt.user}
            ],
            "response_format": {"type": "json_object"},
            "temperature": request.temperature,
            "max_tokens": request.max_output_tokens
        });

        tracing::debug!(model = %request.model, "sending OpenAI chat completion request");
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await
            .map_err(CrossCheckError::provider_transport)?;

        let json = read_success_json(response).await?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                CrossCheckError::MalformedProviderResponse("OpenAI response content is empty".into())
            })
    }
}

/// Turns non-2xx statuses into `ProviderRequestFailed` and decodes the body.
async fn read_success_json(
    response: reqwest::Response,
) -> Result<serde_json::Value, CrossCheckError> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let reason = if text.trim().is_empty() {
            status.canonical_reason().unwrap_or("").to_string()
        } else {
            text
        };
        return Err(CrossCheckError::ProviderRequestFailed {
            status: Some(status.as_u16()),
            reason,
        });
    }

    response.json().await.map_err(|e| {
        CrossCheckError::MalformedProviderResponse(format!("Failed to parse response: {e}"))
    })
}

// ---------------------------------------------------------------------------
// Mock (for testing)
// ---------------------------------------------------------------------------

/// A backend that returns a fixed response and records what it was asked.
pub struct MockBackend {
    response: Result<String, (Option<u16>, String)>,
    calls: AtomicUsize,
    last: Mutex<Option<(String, CompletionRequest)>>,
}

impl MockBackend {
    /// Create a mock backend that always returns the given text.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Ok(response.into()),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    /// Create a mock backend whose every call fails with the given status.
    pub fn failing(status: Option<u16>, reason: impl Into<String>) -> Self {
        Self {
            response: Err((status, reason.into())),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The credential and request of the most recent call.
    pub fn last_call(&self) -> Option<(String, CompletionRequest)> {
        self.last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        credential: &str,
        request: &CompletionRequest,
    ) -> Result<String, CrossCheckError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) =
            Some((credential.to_string(), request.clone()));

        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err((status, reason)) => Err(CrossCheckError::ProviderRequestFailed {
                status: *status,
                reason: reason.clone(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(model: &str) -> CompletionRequest {
        CompletionRequest {
            model: model.into(),
            prompt: Prompt::new("system text", "user text"),
            temperature: REVIEW_TEMPERATURE,
            max_output_tokens: 2000,
        }
    }

    #[tokio::test]
    async fn gemini_sends_json_generation_config() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
            .and(header("x-goog-api-key", "AIza-test"))
            .and(body_partial_json(serde_json::json!({
                "systemInstruction": {"parts": [{"text": "system text"}]},
                "contents": [{"role": "user", "parts": [{"text": "user text"}]}],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "maxOutputTokens": 2000
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = GeminiBackend::new(server.uri());
        let text = backend
            .complete("AIza-test", &request("gemini-1.5-pro"))
            .await
            .unwrap();
        assert_eq!(text, "{\"a\":1}");
    }

    #[tokio::test]
    async fn gemini_http_error_is_provider_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let backend = GeminiBackend::new(server.uri());
        let err = backend.complete("bad", &request("m")).await.unwrap_err();
        match err {
            CrossCheckError::ProviderRequestFailed { status, reason } => {
                assert_eq!(status, Some(403));
                assert!(reason.contains("API key not valid"));
            }
            other => panic!("Expected ProviderRequestFailed, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn openai_sends_bearer_and_json_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer tok-1"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-5.2",
                "response_format": {"type": "json_object"},
                "max_tokens": 2000,
                "messages": [
                    {"role": "system", "content": "system text"},
                    {"role": "user", "content": "user text"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"ok\":true}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new(format!("{}/", server.uri()));
        let text = backend.complete("tok-1", &request("gpt-5.2")).await.unwrap();
        assert_eq!(text, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn openai_empty_content_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": null}}]
            })))
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new(server.uri());
        let err = backend.complete("tok", &request("m")).await.unwrap_err();
        assert!(matches!(err, CrossCheckError::MalformedProviderResponse(_)));
    }

    #[tokio::test]
    async fn openai_status_without_body_uses_canonical_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new(server.uri());
        let err = backend.complete("tok", &request("m")).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Provider request failed: HTTP 429 Too Many Requests"
        );
    }

    #[tokio::test]
    async fn mock_backend_records_calls() {
        let backend = MockBackend::new("{}");
        let text = backend.complete("cred", &request("m")).await.unwrap();
        assert_eq!(text, "{}");
        assert_eq!(backend.calls(), 1);
        let (credential, req) = backend.last_call().unwrap();
        assert_eq!(credential, "cred");
        assert_eq!(req.model, "m");
    }

    #[test]
    fn backend_trait_is_object_safe() {
        let backend: Box<dyn CompletionBackend> = Box::new(MockBackend::new("x"));
        assert_eq!(backend.name(), "mock");
        assert_eq!(GeminiBackend::default().name(), "gemini");
        assert_eq!(OpenAiBackend::default().name(), "openai");
    }
}
