//! Hosted checkout session creation.

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::AuthUser;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("No subscription price configured")]
    NotConfigured,
    #[error("Payment provider returned {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("Payment provider request failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionCreated {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

pub struct CheckoutClient {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
    price_id: Option<String>,
    app_url: String,
}

impl CheckoutClient {
    pub fn new(
        client: reqwest::Client,
        api_base: &str,
        secret_key: &str,
        price_id: Option<String>,
        app_url: &str,
    ) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
            price_id,
            app_url: app_url.trim_end_matches('/').to_string(),
        }
    }

    /// Form fields for a subscription checkout tagged with the user's id.
    ///
    /// `metadata[user_id]` is what the completion webhook keys the upsert on.
    pub fn session_form(&self, user: &AuthUser) -> Result<Vec<(String, String)>, CheckoutError> {
        let price_id = self.price_id.as_ref().ok_or(CheckoutError::NotConfigured)?;

        let mut form = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("line_items[0][price]".to_string(), price_id.clone()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            (
                "success_url".to_string(),
                format!("{}/dashboard?checkout=success", self.app_url),
            ),
            (
                "cancel_url".to_string(),
                format!("{}/dashboard?checkout=cancelled", self.app_url),
            ),
            ("client_reference_id".to_string(), user.id.clone()),
            ("metadata[user_id]".to_string(), user.id.clone()),
            ("subscription_data[metadata][user_id]".to_string(), user.id.clone()),
        ];
        if let Some(email) = &user.email {
            form.push(("customer_email".to_string(), email.clone()));
        }
        Ok(form)
    }

    pub async fn create_session(&self, user: &AuthUser) -> Result<CheckoutSessionCreated, CheckoutError> {
        let form = self.session_form(user)?;

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", uuid::Uuid::new_v4().to_string())
            .form(&form)
            .send()
            .await
            .map_err(|e| CheckoutError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorBody>(&text)
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or(text);
            warn!("Checkout session creation failed ({}): {}", status, message);
            return Err(CheckoutError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let session = response
            .json::<CheckoutSessionCreated>()
            .await
            .map_err(|e| CheckoutError::Transport(format!("malformed session response: {}", e)))?;

        info!(user_id = %user.id, session_id = %session.id, "Checkout session created");
        Ok(session)
    }
}
