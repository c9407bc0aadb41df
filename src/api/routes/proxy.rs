//! Authenticated pass-through to the backend for preferences and summaries.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::Value;

use super::bearer;
use crate::api::error::ApiResult;
use crate::api::AppState;
use crate::backend::{Preferences, RefineRequest, RefineResponse, SummaryList};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/preferences", get(get_preferences).post(save_preferences))
        .route("/summaries", get(list_summaries))
        .route("/summaries/:id", delete(delete_summary))
        .route("/refine-summary", post(refine_summary))
}

/// GET /api/preferences
async fn get_preferences(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Preferences>> {
    let token = bearer(&headers)?;
    Ok(Json(state.backend.get_preferences(token).await?))
}

/// POST /api/preferences
async fn save_preferences(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(prefs): Json<Preferences>,
) -> ApiResult<Json<Value>> {
    let token = bearer(&headers)?;
    Ok(Json(state.backend.save_preferences(token, &prefs).await?))
}

/// GET /api/summaries
async fn list_summaries(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<SummaryList>> {
    let token = bearer(&headers)?;
    Ok(Json(state.backend.list_summaries(token).await?))
}

/// DELETE /api/summaries/:id
async fn delete_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let token = bearer(&headers)?;
    state.backend.delete_summary(token, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/refine-summary
async fn refine_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RefineRequest>,
) -> ApiResult<Json<RefineResponse>> {
    let token = bearer(&headers)?;
    Ok(Json(state.backend.refine_summary(token, &request).await?))
}
