//! Subscription store seam.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Activation, SubscriptionRecord, SubscriptionStatus};
use crate::db::{Database, SubscriptionRepository};

/// Where subscription rows live. The webhook handler is the only writer.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn upsert_active(&self, activation: Activation) -> Result<()>;

    /// Returns how many rows matched `subscription_id`.
    async fn update_status(
        &self,
        subscription_id: &str,
        status: SubscriptionStatus,
        current_period_end: Option<DateTime<Utc>>,
        occurred_at: DateTime<Utc>,
    ) -> Result<usize>;

    /// Returns how many rows matched `subscription_id`.
    async fn cancel(&self, subscription_id: &str, occurred_at: DateTime<Utc>) -> Result<usize>;

    async fn get_by_user(&self, user_id: &str) -> Result<Option<SubscriptionRecord>>;
}

/// SQLite-backed store.
#[derive(Clone)]
pub struct SqliteSubscriptionStore {
    db: Database,
}

impl SqliteSubscriptionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubscriptionStore for SqliteSubscriptionStore {
    async fn upsert_active(&self, activation: Activation) -> Result<()> {
        self.db
            .call(move |conn| SubscriptionRepository::upsert_active(conn, &activation))
            .await
    }

    async fn update_status(
        &self,
        subscription_id: &str,
        status: SubscriptionStatus,
        current_period_end: Option<DateTime<Utc>>,
        occurred_at: DateTime<Utc>,
    ) -> Result<usize> {
        let subscription_id = subscription_id.to_string();
        self.db
            .call(move |conn| {
                SubscriptionRepository::update_status(
                    conn,
                    &subscription_id,
                    &status,
                    current_period_end,
                    occurred_at,
                )
            })
            .await
    }

    async fn cancel(&self, subscription_id: &str, occurred_at: DateTime<Utc>) -> Result<usize> {
        let subscription_id = subscription_id.to_string();
        self.db
            .call(move |conn| SubscriptionRepository::cancel(conn, &subscription_id, occurred_at))
            .await
    }

    async fn get_by_user(&self, user_id: &str) -> Result<Option<SubscriptionRecord>> {
        let user_id = user_id.to_string();
        self.db
            .call(move |conn| SubscriptionRepository::get_by_user(conn, &user_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_sqlite_store_lifecycle() {
        let store = SqliteSubscriptionStore::new(Database::in_memory().unwrap());
        let now = Utc::now();

        store
            .upsert_active(Activation {
                user_id: "u1".to_string(),
                stripe_customer_id: Some("cus_1".to_string()),
                stripe_subscription_id: Some("sub_1".to_string()),
                current_period_end: now + Duration::days(30),
                occurred_at: now,
            })
            .await
            .unwrap();

        let rec = store.get_by_user("u1").await.unwrap().unwrap();
        assert!(rec.is_active_at(now));

        let touched = store
            .update_status("sub_1", SubscriptionStatus::PastDue, None, now)
            .await
            .unwrap();
        assert_eq!(touched, 1);
        assert!(!store.get_by_user("u1").await.unwrap().unwrap().is_active_at(now));

        assert_eq!(store.cancel("sub_1", now).await.unwrap(), 1);
        assert_eq!(
            store.get_by_user("u1").await.unwrap().unwrap().status,
            Some(SubscriptionStatus::Cancelled)
        );
    }
}
