//! Shared types for the HTTP API layer.

use std::sync::Arc;

use serde::Deserialize;

use crate::pipeline::Simplifier;

/// Response header naming where a result came from (provider name or `local`).
pub const SOURCE_HEADER: &str = "x-simplify-source";

/// Response header carrying the per-request id assigned by the access log.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub simplifier: Arc<Simplifier>,
    /// RFC 3339 timestamp of service start.
    pub started_at: String,
}

impl ApiContext {
    pub fn new(simplifier: Arc<Simplifier>) -> Self {
        Self {
            simplifier,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// `POST /api/simplify` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifyRequest {
    #[serde(default)]
    pub raw_text: Option<String>,
}

/// `POST /api/ai-translate` body. Extra fields (e.g. `provider`) are ignored.
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: Option<String>,
}
