//! Stripe event payloads. Only the fields the handler reads are modelled.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEventType {
    CheckoutSessionCompleted,
    SubscriptionUpdated,
    SubscriptionDeleted,
    Unknown,
}

impl StripeEventType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: Option<i64>,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

impl StripeEvent {
    pub fn kind(&self) -> StripeEventType {
        StripeEventType::from_name(&self.event_type)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created.and_then(unix_to_datetime)
    }

    pub fn object<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default, deserialize_with = "expandable_id")]
    pub customer: Option<String>,
    #[serde(default, deserialize_with = "expandable_id")]
    pub subscription: Option<String>,
    #[serde(default, deserialize_with = "nullable_map")]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    pub fn user_id(&self) -> Option<&str> {
        self.metadata
            .get("user_id")
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

impl StripeSubscription {
    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        self.current_period_end.and_then(unix_to_datetime)
    }
}

pub fn unix_to_datetime(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Expandable {
    Id(String),
    Object { id: String },
}

// References arrive as ids, or as full objects when expanded.
fn expandable_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Expandable>::deserialize(deserializer)?.map(|e| match e {
        Expandable::Id(id) => id,
        Expandable::Object { id } => id,
    }))
}

fn nullable_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<HashMap<String, String>, D::Error> {
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_kinds() {
        assert_eq!(
            StripeEventType::from_name("checkout.session.completed"),
            StripeEventType::CheckoutSessionCompleted
        );
        assert_eq!(
            StripeEventType::from_name("invoice.paid"),
            StripeEventType::Unknown
        );
    }

    #[test]
    fn test_checkout_session_fields() {
        let event: StripeEvent = serde_json::from_value(json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "created": 1_700_000_000,
            "data": {"object": {
                "id": "cs_1",
                "customer": "cus_1",
                "subscription": {"id": "sub_1", "object": "subscription"},
                "metadata": {"user_id": "u1"}
            }}
        }))
        .unwrap();

        let session: CheckoutSession = event.object().unwrap();
        assert_eq!(session.user_id(), Some("u1"));
        assert_eq!(session.customer.as_deref(), Some("cus_1"));
        assert_eq!(session.subscription.as_deref(), Some("sub_1"));
        assert_eq!(event.created_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_checkout_session_without_metadata() {
        let session: CheckoutSession =
            serde_json::from_value(json!({"id": "cs_1", "metadata": null, "customer": null}))
                .unwrap();
        assert!(session.user_id().is_none());
        assert!(session.customer.is_none());

        let blank: CheckoutSession =
            serde_json::from_value(json!({"id": "cs_2", "metadata": {"user_id": ""}})).unwrap();
        assert!(blank.user_id().is_none());
    }

    #[test]
    fn test_subscription_period_end() {
        let sub: StripeSubscription = serde_json::from_value(json!({
            "id": "sub_1",
            "status": "past_due",
            "current_period_end": 1_700_000_000
        }))
        .unwrap();
        assert_eq!(sub.period_end().unwrap().timestamp(), 1_700_000_000);
    }
}
