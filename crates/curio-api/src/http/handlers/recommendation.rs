//! Recommendation endpoint.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use tracing::Instrument;

use curio_observe::attrs;
use curio_types::recommendation::RecommendationOutcome;
use curio_types::request::RecommendationRequest;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestMeta};
use crate::state::AppState;

/// POST /api/v1/recommendations
pub async fn create_recommendations(
    State(state): State<AppState>,
    body: Result<Json<RecommendationRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RecommendationOutcome>>, AppError> {
    let meta = RequestMeta::start();
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    let span = tracing::info_span!(
        "http_recommend",
        { attrs::GEN_AI_OPERATION_NAME } = attrs::OP_RECOMMEND,
        { attrs::USER_ID } = %request.user_id,
        { attrs::ENGINE } = tracing::field::Empty,
        { attrs::INTENT } = tracing::field::Empty,
        { attrs::RESULT_COUNT } = tracing::field::Empty,
        { attrs::CACHE_HIT } = tracing::field::Empty,
        { attrs::DEGRADED } = tracing::field::Empty,
    );
    let outcome = state
        .recommender
        .recommend(&request)
        .instrument(span.clone())
        .await?;

    span.record(attrs::ENGINE, outcome.engine_used.to_string().as_str());
    if let Some(intent) = &outcome.intent {
        span.record(attrs::INTENT, intent.intent_type.to_string().as_str());
    }
    span.record(attrs::RESULT_COUNT, outcome.recommendations.len() as u64);
    span.record(attrs::CACHE_HIT, outcome.cache_hit);
    span.record(attrs::DEGRADED, outcome.degraded);

    Ok(Json(
        ApiResponse::success(outcome, &meta).with_link("self", "/api/v1/recommendations"),
    ))
}
