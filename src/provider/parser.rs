use serde::Deserialize;

use super::ProviderError;
use crate::pipeline::compose::{reminders_step, REMINDERS_TITLE};
use crate::pipeline::confidence::{provider_confidence, UNSTRUCTURED_PROVIDER_CONFIDENCE};
use crate::pipeline::extraction::{extract_entities, EntitySet};
use crate::pipeline::types::{InstructionStep, SimplificationResult};

/// Title of the single step used when a provider answers in free text.
pub const FREE_TEXT_STEP_TITLE: &str = "Instructions";

/// Top-level fields of a provider's JSON reply. Everything is optional and
/// parsed leniently so one bad field does not discard the whole answer.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReply {
    plain_text: Option<String>,
    steps: Option<Vec<serde_json::Value>>,
    entities: Option<serde_json::Value>,
    confidence: Option<serde_json::Value>,
    warnings: Option<Vec<serde_json::Value>>,
}

/// Turn a provider reply into a [`SimplificationResult`].
///
/// JSON replies (bare or inside a ```json fence) are mapped field by field;
/// anything else is wrapped as a single free-text step. `raw_text` is the
/// original prescription, used for local entity extraction when the
/// provider did not supply entities.
pub fn parse_provider_reply(
    reply: &str,
    raw_text: &str,
) -> Result<SimplificationResult, ProviderError> {
    let reply = reply.trim();
    if reply.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }

    let parsed = serde_json::from_str::<RawReply>(extract_json_block(reply));
    match parsed {
        Ok(raw) if raw.plain_text.is_some() || raw.steps.is_some() => {
            Ok(from_structured(raw, reply, raw_text))
        }
        Ok(_) => Ok(wrap_free_text(reply, raw_text)),
        Err(e) => {
            tracing::debug!(error = %e, "Provider reply is not JSON, wrapping as free text");
            Ok(wrap_free_text(reply, raw_text))
        }
    }
}

fn from_structured(raw: RawReply, reply: &str, raw_text: &str) -> SimplificationResult {
    let plain_text = raw
        .plain_text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| reply.to_string());

    let mut steps: Vec<InstructionStep> = parse_array_lenient(raw.steps.as_deref())
        .into_iter()
        .filter(|s: &InstructionStep| !s.title.trim().is_empty() && !s.body.trim().is_empty())
        .collect();
    ensure_reminders(&mut steps);

    let entities = raw
        .entities
        .and_then(|v| serde_json::from_value::<EntitySet>(v).ok())
        .unwrap_or_else(|| extract_entities(raw_text));

    let confidence = provider_confidence(raw.confidence.as_ref().and_then(|v| v.as_f64()));

    let warnings = raw
        .warnings
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
        .collect();

    SimplificationResult {
        plain_text,
        steps,
        entities,
        confidence,
        warnings,
    }
}

fn wrap_free_text(reply: &str, raw_text: &str) -> SimplificationResult {
    SimplificationResult {
        plain_text: reply.to_string(),
        steps: vec![InstructionStep::new(FREE_TEXT_STEP_TITLE, reply), reminders_step()],
        entities: extract_entities(raw_text),
        confidence: UNSTRUCTURED_PROVIDER_CONFIDENCE,
        warnings: vec![],
    }
}

/// Append the closing reminders unless the provider already wrote them.
fn ensure_reminders(steps: &mut Vec<InstructionStep>) {
    let needle = REMINDERS_TITLE.to_lowercase();
    if !steps.iter().any(|s| s.title.to_lowercase().contains(&needle)) {
        steps.push(reminders_step());
    }
}

/// The JSON payload of a reply: the contents of the first fenced block if
/// there is one, otherwise the whole reply.
fn extract_json_block(reply: &str) -> &str {
    let (start, fence_len) = match (reply.find("```json"), reply.find("```")) {
        (Some(start), _) => (start, 7),
        (None, Some(start)) => (start, 3),
        (None, None) => return reply,
    };
    let content = &reply[start + fence_len..];
    match content.find("```") {
        Some(end) => content[..end].trim(),
        None => content.trim(),
    }
}

/// Parse an array leniently, skipping items that fail to deserialize.
fn parse_array_lenient<T: for<'de> Deserialize<'de>>(items: Option<&[serde_json::Value]>) -> Vec<T> {
    match items {
        None => vec![],
        Some(arr) => arr
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
    }
}
