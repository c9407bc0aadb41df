//! Entitlement route.

use axum::{extract::State, http::HeaderMap, response::Json, routing::get, Router};

use super::bearer;
use crate::api::error::ApiResult;
use crate::api::AppState;
use crate::entitlement::Entitlement;

pub fn router() -> Router<AppState> {
    Router::new().route("/entitlement", get(get_entitlement))
}

/// GET /api/entitlement - May the caller generate a summary now?
async fn get_entitlement(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Entitlement>> {
    let token = bearer(&headers)?;
    state.query.resolve_user(token).await?;

    Ok(Json(state.gate.check(token).await))
}
