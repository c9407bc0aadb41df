//! Stripe webhook handling: verify, parse, then mirror the event into the
//! subscription store.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::events::{CheckoutSession, StripeEvent, StripeEventType, StripeSubscription};
use super::signature::{verify_signature, SignatureError};
use crate::subscription::{Activation, SubscriptionStatus, SubscriptionStore};

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Invalid signature")]
    InvalidSignature(#[source] SignatureError),
    #[error("Invalid payload: {0}")]
    Parse(String),
    #[error("Webhook handler failed: {0:#}")]
    Handler(anyhow::Error),
}

/// What a delivered event did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Activated { user_id: String },
    Updated { subscription_id: String, status: SubscriptionStatus },
    Cancelled { subscription_id: String },
    /// Checkout completed without `metadata.user_id`; nothing to attach it to.
    MissingUserId,
    /// Update or delete for a subscription we hold no row for.
    NoMatchingSubscription { subscription_id: String },
    Ignored { event_type: String },
}

#[derive(Clone)]
pub struct WebhookHandler {
    store: Arc<dyn SubscriptionStore>,
    secret: String,
    tolerance_secs: u64,
    placeholder_period: Duration,
}

impl WebhookHandler {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        secret: &str,
        tolerance_secs: u64,
        placeholder_period_days: i64,
    ) -> Self {
        Self {
            store,
            secret: secret.to_string(),
            tolerance_secs,
            placeholder_period: Duration::days(placeholder_period_days),
        }
    }

    pub async fn handle(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, WebhookError> {
        self.handle_at(payload, signature, Utc::now()).await
    }

    pub async fn handle_at(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<WebhookOutcome, WebhookError> {
        let header = signature.ok_or(WebhookError::InvalidSignature(SignatureError::Malformed))?;
        verify_signature(
            payload,
            header,
            &self.secret,
            self.tolerance_secs,
            now.timestamp(),
        )
        .map_err(|e| {
            warn!("Rejected webhook: {}", e);
            WebhookError::InvalidSignature(e)
        })?;

        let event: StripeEvent =
            serde_json::from_slice(payload).map_err(|e| WebhookError::Parse(e.to_string()))?;

        info!(event_id = %event.id, event_type = %event.event_type, "Processing Stripe webhook");

        // Anchor writes on the event's own time so a redelivery writes the same values.
        let occurred_at = event.created_at().unwrap_or(now);

        match event.kind() {
            StripeEventType::CheckoutSessionCompleted => {
                let session: CheckoutSession = event
                    .object()
                    .map_err(|e| WebhookError::Parse(e.to_string()))?;
                self.on_checkout_completed(session, occurred_at).await
            }
            StripeEventType::SubscriptionUpdated => {
                let subscription: StripeSubscription = event
                    .object()
                    .map_err(|e| WebhookError::Parse(e.to_string()))?;
                self.on_subscription_updated(subscription, occurred_at).await
            }
            StripeEventType::SubscriptionDeleted => {
                let subscription: StripeSubscription = event
                    .object()
                    .map_err(|e| WebhookError::Parse(e.to_string()))?;
                self.on_subscription_deleted(subscription, occurred_at).await
            }
            StripeEventType::Unknown => {
                debug!("Ignoring event type {}", event.event_type);
                Ok(WebhookOutcome::Ignored {
                    event_type: event.event_type,
                })
            }
        }
    }

    async fn on_checkout_completed(
        &self,
        session: CheckoutSession,
        occurred_at: DateTime<Utc>,
    ) -> Result<WebhookOutcome, WebhookError> {
        let Some(user_id) = session.user_id().map(str::to_string) else {
            warn!(session_id = %session.id, "Checkout session has no user_id in metadata");
            return Ok(WebhookOutcome::MissingUserId);
        };

        // Fixed placeholder period until the first subscription.updated arrives.
        let activation = Activation {
            user_id: user_id.clone(),
            stripe_customer_id: session.customer,
            stripe_subscription_id: session.subscription,
            current_period_end: occurred_at + self.placeholder_period,
            occurred_at,
        };

        self.store
            .upsert_active(activation)
            .await
            .map_err(WebhookError::Handler)?;

        info!(user_id = %user_id, "Subscription activated");
        Ok(WebhookOutcome::Activated { user_id })
    }

    async fn on_subscription_updated(
        &self,
        subscription: StripeSubscription,
        occurred_at: DateTime<Utc>,
    ) -> Result<WebhookOutcome, WebhookError> {
        let status = SubscriptionStatus::parse(&subscription.status);
        let touched = self
            .store
            .update_status(
                &subscription.id,
                status.clone(),
                subscription.period_end(),
                occurred_at,
            )
            .await
            .map_err(WebhookError::Handler)?;

        if touched == 0 {
            warn!(subscription_id = %subscription.id, "No subscription row to update");
            return Ok(WebhookOutcome::NoMatchingSubscription {
                subscription_id: subscription.id,
            });
        }

        info!(subscription_id = %subscription.id, status = %status, "Subscription updated");
        Ok(WebhookOutcome::Updated {
            subscription_id: subscription.id,
            status,
        })
    }

    async fn on_subscription_deleted(
        &self,
        subscription: StripeSubscription,
        occurred_at: DateTime<Utc>,
    ) -> Result<WebhookOutcome, WebhookError> {
        let touched = self
            .store
            .cancel(&subscription.id, occurred_at)
            .await
            .map_err(WebhookError::Handler)?;

        if touched == 0 {
            warn!(subscription_id = %subscription.id, "No subscription row to cancel");
            return Ok(WebhookOutcome::NoMatchingSubscription {
                subscription_id: subscription.id,
            });
        }

        info!(subscription_id = %subscription.id, "Subscription cancelled");
        Ok(WebhookOutcome::Cancelled {
            subscription_id: subscription.id,
        })
    }
}
