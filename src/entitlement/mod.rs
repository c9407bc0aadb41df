//! Entitlement gate: may this caller generate a summary right now?
//!
//! Subscribed callers always may. Everyone else gets `free_quota` summaries,
//! counted from what the backend already holds for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::BackendApi;
use crate::subscription::SubscriptionQuery;

/// What to do when the subscription or summary lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LookupFailurePolicy {
    /// Treat a failed subscription lookup as unsubscribed and a failed count as zero.
    #[default]
    Degrade,
    Deny,
    Allow,
}

impl LookupFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Degrade => "degrade",
            Self::Deny => "deny",
            Self::Allow => "allow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub can_generate: bool,
    pub summaries_count: usize,
    pub is_subscribed: bool,
}

pub fn decide(is_subscribed: bool, summaries_count: usize, free_quota: usize) -> bool {
    is_subscribed || summaries_count < free_quota
}

#[derive(Clone)]
pub struct EntitlementGate {
    query: SubscriptionQuery,
    backend: Arc<dyn BackendApi>,
    free_quota: usize,
    policy: LookupFailurePolicy,
}

impl EntitlementGate {
    pub fn new(
        query: SubscriptionQuery,
        backend: Arc<dyn BackendApi>,
        free_quota: usize,
        policy: LookupFailurePolicy,
    ) -> Self {
        Self {
            query,
            backend,
            free_quota,
            policy,
        }
    }

    pub fn policy(&self) -> LookupFailurePolicy {
        self.policy
    }

    pub async fn check(&self, token: &str) -> Entitlement {
        self.check_at(token, Utc::now()).await
    }

    pub async fn check_at(&self, token: &str, now: DateTime<Utc>) -> Entitlement {
        let is_subscribed = match self.query.lookup(token, now).await {
            Ok(lookup) => Some(lookup.is_subscribed),
            Err(e) => {
                warn!("Subscription lookup failed: {:#}", e);
                None
            }
        };

        let summaries_count = match self.backend.count_summaries(token).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!("Summary count failed: {}", e);
                None
            }
        };

        let entitlement = match (is_subscribed, summaries_count) {
            (Some(is_subscribed), Some(summaries_count)) => Entitlement {
                can_generate: decide(is_subscribed, summaries_count, self.free_quota),
                summaries_count,
                is_subscribed,
            },
            (is_subscribed, summaries_count) => {
                let is_subscribed = is_subscribed.unwrap_or(false);
                let summaries_count = summaries_count.unwrap_or(0);
                let can_generate = match self.policy {
                    LookupFailurePolicy::Degrade => {
                        decide(is_subscribed, summaries_count, self.free_quota)
                    }
                    LookupFailurePolicy::Deny => false,
                    LookupFailurePolicy::Allow => true,
                };
                debug!(
                    "Applied {} lookup-failure policy: can_generate={}",
                    self.policy.as_str(),
                    can_generate
                );
                Entitlement {
                    can_generate,
                    summaries_count,
                    is_subscribed,
                }
            }
        };

        debug!(
            can_generate = entitlement.can_generate,
            summaries_count = entitlement.summaries_count,
            is_subscribed = entitlement.is_subscribed,
            "Entitlement checked"
        );
        entitlement
    }
}
