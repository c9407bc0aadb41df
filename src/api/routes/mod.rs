//! API route modules.

pub mod checkout;
pub mod entitlement;
pub mod proxy;
pub mod uploads;
pub mod webhooks;

use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::api::error::ApiResult;
use crate::auth::bearer_token;

/// Bearer token from the request headers, or 401.
pub(crate) fn bearer(headers: &HeaderMap) -> ApiResult<&str> {
    let value = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    Ok(bearer_token(value)?)
}
