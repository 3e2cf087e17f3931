//! External AI providers used to translate prescriptions.
//!
//! Every provider sits behind [`LlmClient`] so the orchestrator can run
//! against OpenAI, a local Ollama instance, or a mock in tests. Provider
//! failures never reach API callers; the orchestrator falls back to the
//! rule-based pipeline instead.

pub mod ollama;
pub mod openai;
pub mod parser;
pub mod prompt;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use parser::parse_provider_reply;
pub use prompt::{build_simplify_prompt, SIMPLIFY_SYSTEM_PROMPT};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("AI provider is not reachable at {0}")]
    Connection(String),

    #[error("AI provider returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("AI provider did not answer within {0:?}")]
    Timeout(Duration),

    #[error("AI provider call was cancelled")]
    Cancelled,

    #[error("AI provider returned an empty reply")]
    EmptyResponse,

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("No compatible model available")]
    NoModelAvailable,
}

/// Map a reqwest send failure onto the provider error taxonomy.
pub(crate) fn map_send_error(e: reqwest::Error, base_url: &str, timeout: Duration) -> ProviderError {
    if e.is_connect() {
        ProviderError::Connection(base_url.to_string())
    } else if e.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        ProviderError::Http(e.to_string())
    }
}

/// Turn a non-success response into [`ProviderError::Status`], passing
/// successful responses through.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}

/// LLM client abstraction (allows mocking).
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Short provider name, reported to API callers as the result source.
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str, system: &str) -> Result<String, ProviderError>;
}

/// Mock LLM client for testing. Returns a configurable reply or error.
pub struct MockLlmClient {
    reply: Result<String, fn() -> ProviderError>,
    delay: Option<Duration>,
}

impl MockLlmClient {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            delay: None,
        }
    }

    pub fn failing(error: fn() -> ProviderError) -> Self {
        Self {
            reply: Err(error),
            delay: None,
        }
    }

    /// Sleep before answering, to exercise timeouts and cancellation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, _prompt: &str, _system: &str) -> Result<String, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(make_error) => Err(make_error()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_client_returns_configured_reply() {
        let client = MockLlmClient::new("test reply");
        let reply = client.generate("prompt", "system").await.unwrap();
        assert_eq!(reply, "test reply");
    }

    #[tokio::test]
    async fn mock_client_returns_configured_error() {
        let client = MockLlmClient::failing(|| ProviderError::Connection("http://x".into()));
        let err = client.generate("prompt", "system").await.unwrap_err();
        assert!(matches!(err, ProviderError::Connection(_)));
    }

    #[test]
    fn errors_render_readable_messages() {
        let err = ProviderError::Status {
            status: 401,
            body: "invalid api key".into(),
        };
        assert_eq!(
            err.to_string(),
            "AI provider returned error (status 401): invalid api key"
        );
        assert_eq!(
            ProviderError::Timeout(Duration::from_secs(30)).to_string(),
            "AI provider did not answer within 30s"
        );
        assert_eq!(
            ProviderError::Timeout(Duration::from_millis(250)).to_string(),
            "AI provider did not answer within 250ms"
        );
    }
}
