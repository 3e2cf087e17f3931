use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use super::compose::compose;
use super::confidence::LOCAL_PIPELINE_CONFIDENCE;
use super::extraction::extract_entities;
use super::normalize::normalize;
use super::terminology::TerminologyDictionary;
use super::types::SimplificationResult;
use super::InputError;
use crate::provider::{
    build_simplify_prompt, parse_provider_reply, LlmClient, ProviderError, SIMPLIFY_SYSTEM_PROMPT,
};

/// Source name reported for results of the rule-based pipeline.
pub const LOCAL_SOURCE: &str = "local";

/// Result of a simplification, tagged with where it came from.
#[derive(Debug)]
pub enum SimplifyOutcome {
    Provider {
        provider: &'static str,
        result: SimplificationResult,
    },
    /// Local pipeline result. `cause` is `None` when no provider is
    /// configured.
    Fallback {
        cause: Option<ProviderError>,
        result: SimplificationResult,
    },
}

impl SimplifyOutcome {
    pub fn result(&self) -> &SimplificationResult {
        match self {
            Self::Provider { result, .. } | Self::Fallback { result, .. } => result,
        }
    }

    pub fn into_result(self) -> SimplificationResult {
        match self {
            Self::Provider { result, .. } | Self::Fallback { result, .. } => result,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// Provider name, or `"local"` for the rule-based pipeline.
    pub fn source(&self) -> &'static str {
        match self {
            Self::Provider { provider, .. } => *provider,
            Self::Fallback { .. } => LOCAL_SOURCE,
        }
    }
}

struct ProviderSlot {
    client: Arc<dyn LlmClient>,
    timeout: Duration,
}

/// Orchestrates prescription simplification:
/// provider (bounded by timeout) → parse, or extract → normalize → compose.
pub struct Simplifier {
    dictionary: Arc<TerminologyDictionary>,
    provider: Option<ProviderSlot>,
}

impl Simplifier {
    pub fn new(dictionary: Arc<TerminologyDictionary>) -> Self {
        Self {
            dictionary,
            provider: None,
        }
    }

    pub fn with_provider(mut self, client: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        self.provider = Some(ProviderSlot { client, timeout });
        self
    }

    /// Name of the configured provider, if any.
    pub fn provider_name(&self) -> Option<&'static str> {
        self.provider.as_ref().map(|p| p.client.name())
    }

    /// Run the rule-based pipeline only.
    pub fn simplify_local(&self, raw_text: &str) -> Result<SimplificationResult, InputError> {
        validate_input(raw_text)?;
        Ok(self.local_result(raw_text))
    }

    /// Simplify with the provider when one is configured, falling back to
    /// the local pipeline on any provider failure.
    pub async fn simplify(&self, raw_text: &str) -> Result<SimplifyOutcome, InputError> {
        self.simplify_until(raw_text, std::future::pending()).await
    }

    /// Like [`Simplifier::simplify`], but abandons the provider call as soon
    /// as `cancel` completes and answers from the local pipeline.
    pub async fn simplify_until<C>(
        &self,
        raw_text: &str,
        cancel: C,
    ) -> Result<SimplifyOutcome, InputError>
    where
        C: Future<Output = ()>,
    {
        validate_input(raw_text)?;

        let Some(slot) = &self.provider else {
            return Ok(SimplifyOutcome::Fallback {
                cause: None,
                result: self.local_result(raw_text),
            });
        };

        let span = tracing::info_span!(
            "provider_call",
            provider = slot.client.name(),
            model = slot.client.model(),
            input_chars = raw_text.chars().count(),
        );

        let attempt = async {
            tokio::select! {
                reply = tokio::time::timeout(slot.timeout, call_provider(slot.client.as_ref(), raw_text)) => {
                    match reply {
                        Ok(result) => result,
                        Err(_) => Err(ProviderError::Timeout(slot.timeout)),
                    }
                }
                _ = cancel => Err(ProviderError::Cancelled),
            }
        }
        .instrument(span)
        .await;

        match attempt {
            Ok(result) => {
                tracing::debug!(
                    provider = slot.client.name(),
                    steps = result.steps.len(),
                    confidence = result.confidence,
                    "Provider simplification complete"
                );
                Ok(SimplifyOutcome::Provider {
                    provider: slot.client.name(),
                    result,
                })
            }
            Err(e) => {
                tracing::warn!(
                    provider = slot.client.name(),
                    error = %e,
                    "Provider simplification failed, using local pipeline"
                );
                Ok(SimplifyOutcome::Fallback {
                    cause: Some(e),
                    result: self.local_result(raw_text),
                })
            }
        }
    }

    fn local_result(&self, raw_text: &str) -> SimplificationResult {
        let entities = extract_entities(raw_text);
        let plain_text = normalize(raw_text, &self.dictionary);
        let explanation = compose(&entities, &plain_text, &self.dictionary);

        tracing::debug!(
            entities = entities.len(),
            steps = explanation.steps.len(),
            warnings = explanation.warnings.len(),
            "Local simplification complete"
        );

        SimplificationResult {
            plain_text,
            steps: explanation.steps,
            entities,
            confidence: LOCAL_PIPELINE_CONFIDENCE,
            warnings: explanation.warnings,
        }
    }
}

async fn call_provider(
    client: &dyn LlmClient,
    raw_text: &str,
) -> Result<SimplificationResult, ProviderError> {
    let prompt = build_simplify_prompt(raw_text);
    let reply = client.generate(&prompt, SIMPLIFY_SYSTEM_PROMPT).await?;
    parse_provider_reply(&reply, raw_text)
}

fn validate_input(raw_text: &str) -> Result<(), InputError> {
    if raw_text.trim().is_empty() {
        return Err(InputError::Empty);
    }
    Ok(())
}
