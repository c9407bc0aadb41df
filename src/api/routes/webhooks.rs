//! Payment-provider webhook intake.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::api::error::ApiResult;
use crate::api::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks/stripe", post(stripe_webhook))
}

/// POST /api/webhooks/stripe - Verify and apply a signed event.
///
/// The body is taken raw; the signature covers the exact bytes sent.
async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());

    let outcome = state.webhooks.handle(&body, signature).await?;
    debug!("Webhook outcome: {:?}", outcome);

    Ok(Json(json!({ "received": true })))
}
