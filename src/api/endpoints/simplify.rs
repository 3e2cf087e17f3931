//! Prescription simplification endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SimplifyRequest, SOURCE_HEADER};

/// `POST /api/simplify`, body `{ "rawText": "..." }`.
pub async fn simplify(
    State(ctx): State<ApiContext>,
    payload: Result<Json<SimplifyRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    respond(&ctx, request.raw_text.as_deref().unwrap_or_default()).await
}

/// Run the simplifier and attach the result source header.
///
/// If the client disconnects, axum drops this future and the provider
/// call with it.
pub(crate) async fn respond(ctx: &ApiContext, text: &str) -> Result<Response, ApiError> {
    let outcome = ctx.simplifier.simplify(text).await?;
    let source = outcome.source();

    tracing::debug!(
        source,
        fallback = outcome.is_fallback(),
        confidence = outcome.result().confidence,
        "Simplification served"
    );

    Ok(([(SOURCE_HEADER, source)], Json(outcome.into_result())).into_response())
}
