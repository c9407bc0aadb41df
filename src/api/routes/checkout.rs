//! Checkout session route.

use axum::{extract::State, http::HeaderMap, response::Json, routing::post, Router};
use serde::Serialize;

use super::bearer;
use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/create-checkout-session", post(create_checkout_session))
}

/// POST /api/create-checkout-session - Start a subscription checkout for the caller.
async fn create_checkout_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<CheckoutResponse>> {
    let token = bearer(&headers)?;
    let user = state.query.resolve_user(token).await?;

    let session = state.checkout.create_session(&user).await?;
    let url = session
        .url
        .ok_or_else(|| ApiError::bad_gateway("Checkout session has no redirect URL"))?;

    Ok(Json(CheckoutResponse { url }))
}
