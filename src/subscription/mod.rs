//! Subscription records and the query helper that reads them for a caller.

pub mod status;
pub mod store;

pub use status::{Activation, SubscriptionRecord, SubscriptionStatus};
pub use store::{SqliteSubscriptionStore, SubscriptionStore};

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::auth::{AuthError, AuthUser, IdentityResolver};

/// What we know about a caller's subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionLookup {
    pub user: AuthUser,
    pub subscription: Option<SubscriptionRecord>,
    pub is_subscribed: bool,
}

/// Resolves a credential to its user and stored subscription.
#[derive(Clone)]
pub struct SubscriptionQuery {
    identity: Arc<dyn IdentityResolver>,
    store: Arc<dyn SubscriptionStore>,
}

impl SubscriptionQuery {
    pub fn new(identity: Arc<dyn IdentityResolver>, store: Arc<dyn SubscriptionStore>) -> Self {
        Self { identity, store }
    }

    pub async fn lookup(&self, token: &str, now: DateTime<Utc>) -> Result<SubscriptionLookup> {
        let user = self.identity.resolve(token).await?;
        let subscription = self.store.get_by_user(&user.id).await?;
        let is_subscribed = subscription
            .as_ref()
            .is_some_and(|record| record.is_active_at(now));

        Ok(SubscriptionLookup {
            user,
            subscription,
            is_subscribed,
        })
    }

    pub async fn resolve_user(&self, token: &str) -> Result<AuthUser, AuthError> {
        self.identity.resolve(token).await
    }
}
