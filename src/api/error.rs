//! API error handling for consistent JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::auth::AuthError;
use crate::backend::BackendError;
use crate::billing::{CheckoutError, WebhookError};
use crate::upload::UploadError;

/// API error type that converts to `{"error": "<message>"}` responses.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!("Internal error: {:#}", err);
        Self::internal(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken => Self::unauthorized(err.to_string()),
            AuthError::Transport(_) => Self::bad_gateway(err.to_string()),
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match &err {
            BackendError::Unauthorized => Self::unauthorized(err.to_string()),
            BackendError::NotFound(message) => Self::not_found(message.clone()),
            BackendError::Status { message, .. } => Self::bad_gateway(message.clone()),
            BackendError::Transport(_) | BackendError::Decode(_) => Self::bad_gateway(err.to_string()),
        }
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::InvalidSignature(_) => Self::bad_request("Invalid signature"),
            WebhookError::Parse(_) => Self::bad_request(err.to_string()),
            WebhookError::Handler(e) => {
                error!("Webhook handler error: {:#}", e);
                Self::internal("Webhook handler failed")
            }
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::NotConfigured => Self::internal(err.to_string()),
            CheckoutError::Provider { .. } | CheckoutError::Transport(_) => {
                Self::bad_gateway(err.to_string())
            }
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::NotAudio | UploadError::Empty => Self::bad_request(err.to_string()),
            UploadError::Backend(e) => e.into(),
            UploadError::Storage(e) => e.into(),
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::SignatureError;

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            ApiError::from(AuthError::MissingToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(BackendError::Status {
                status: 500,
                message: "boom".to_string()
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(WebhookError::InvalidSignature(SignatureError::Mismatch)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(WebhookError::Handler(anyhow::anyhow!("locked"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(UploadError::NotAudio).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
