//! AI translation endpoint, the alternate entry point to the simplifier.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;

use super::simplify::respond;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, TranslateRequest};

/// `POST /api/ai-translate`, body `{ "text": "..." }`.
pub async fn translate(
    State(ctx): State<ApiContext>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    respond(&ctx, request.text.as_deref().unwrap_or_default()).await
}
