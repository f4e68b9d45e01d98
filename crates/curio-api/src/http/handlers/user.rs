//! Per-user endpoints: quota status and cache invalidation.

use axum::Json;
use axum::extract::{Path, State};

use curio_observe::attrs;
use curio_types::identity::UserId;
use curio_types::quota::QuotaState;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestMeta};
use crate::state::AppState;

/// GET /api/v1/users/{id}/quota
pub async fn get_quota(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<QuotaState>>, AppError> {
    let meta = RequestMeta::start();
    let user_id = user_id(id)?;

    let status = state.recommender.get_quota_status(&user_id).await?;

    let href = format!("/api/v1/users/{user_id}/quota");
    Ok(Json(ApiResponse::success(status, &meta).with_link("self", href)))
}

/// POST /api/v1/users/{id}/cache/invalidate
pub async fn invalidate_cache(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let meta = RequestMeta::start();
    let user_id = user_id(id)?;

    let removed = state.recommender.invalidate_user_cache(&user_id).await;
    tracing::info!({ attrs::USER_ID } = %user_id, { attrs::INVALIDATED } = removed, "cache invalidated");

    Ok(Json(ApiResponse::success(
        serde_json::json!({ "user_id": user_id, "invalidated": removed }),
        &meta,
    )))
}

fn user_id(raw: String) -> Result<UserId, AppError> {
    let user_id = UserId::new(raw);
    user_id.check().map_err(AppError::Validation)?;
    Ok(user_id)
}
