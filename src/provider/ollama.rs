use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use super::{check_status, map_send_error, LlmClient, ProviderError};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Reported as the model name until one has been detected.
pub const AUTO_MODEL: &str = "auto";

/// Preferred local models, best first. Matched as name prefixes, so a
/// tagged entry must come before its bare family name.
const MODEL_PREFERENCES: &[&str] = &[
    "medgemma:27b",
    "medgemma:4b",
    "medgemma",
    "llama3.1",
    "llama3",
    "mistral",
];

/// Ollama HTTP client for local LLM inference.
///
/// Without an explicit model the best installed one is detected on first
/// use. A failed detection is not cached, so an instance that comes up
/// after startup is picked up by the next request.
pub struct OllamaClient {
    base_url: String,
    model: OnceCell<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: OnceCell::new(),
            client,
            timeout,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = OnceCell::from(model.into());
        self
    }

    /// The configured model, detecting one if none is known yet.
    pub async fn resolve_model(&self) -> Result<&str, ProviderError> {
        let model = self
            .model
            .get_or_try_init(|| async move {
                let model = self.find_best_model().await?;
                tracing::info!(model = %model, "Ollama model detected");
                Ok::<_, ProviderError>(model)
            })
            .await?;
        Ok(model.as_str())
    }

    /// Names of the models installed on the instance.
    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_send_error(e, &self.base_url, self.timeout))?;

        let parsed: OllamaTagsResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::ResponseParsing(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }

    /// Find the best installed model from the preference list.
    async fn find_best_model(&self) -> Result<String, ProviderError> {
        let available = self.list_models().await?;
        pick_model(&available).ok_or(ProviderError::NoModelAvailable)
    }
}

fn pick_model(available: &[String]) -> Option<String> {
    MODEL_PREFERENCES.iter().find_map(|preferred| {
        available
            .iter()
            .find(|m| m.starts_with(preferred))
            .cloned()
    })
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        self.model.get().map_or(AUTO_MODEL, String::as_str)
    }

    async fn generate(&self, prompt: &str, system: &str) -> Result<String, ProviderError> {
        let model = self.resolve_model().await?;

        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model,
            prompt,
            system,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error(e, &self.base_url, self.timeout))?;

        let parsed: OllamaGenerateResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::ResponseParsing(e.to_string()))?;

        if parsed.response.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(parsed.response)
    }
}
