//! Subscription record persistence.
//!
//! CRUD for the `subscriptions` table. Writes set absolute values keyed by
//! user id or provider subscription id, so replaying them is harmless.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_timestamp, parse_timestamp};
use crate::subscription::{Activation, SubscriptionRecord, SubscriptionStatus};

const COLUMNS: &str = "user_id, stripe_customer_id, stripe_subscription_id, status, \
                       current_period_end, created_at, updated_at";

/// Repository for subscription records.
pub struct SubscriptionRepository;

impl SubscriptionRepository {
    /// Insert or overwrite the user's row with an active subscription.
    pub fn upsert_active(conn: &Connection, activation: &Activation) -> Result<()> {
        let at = format_timestamp(&activation.occurred_at);
        conn.execute(
            "INSERT INTO subscriptions (user_id, stripe_customer_id, stripe_subscription_id, \
             status, current_period_end, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) \
             ON CONFLICT(user_id) DO UPDATE SET \
             stripe_customer_id = excluded.stripe_customer_id, \
             stripe_subscription_id = excluded.stripe_subscription_id, \
             status = excluded.status, \
             current_period_end = excluded.current_period_end, \
             updated_at = excluded.updated_at",
            params![
                activation.user_id,
                activation.stripe_customer_id,
                activation.stripe_subscription_id,
                SubscriptionStatus::Active.as_str(),
                format_timestamp(&activation.current_period_end),
                at,
            ],
        )
        .context("Failed to upsert subscription")?;
        Ok(())
    }

    /// Overwrite status and period end for the row holding `subscription_id`.
    /// Returns the number of rows touched.
    pub fn update_status(
        conn: &Connection,
        subscription_id: &str,
        status: &SubscriptionStatus,
        current_period_end: Option<DateTime<Utc>>,
        occurred_at: DateTime<Utc>,
    ) -> Result<usize> {
        let updated = conn
            .execute(
                "UPDATE subscriptions SET status = ?1, current_period_end = ?2, updated_at = ?3 \
                 WHERE stripe_subscription_id = ?4",
                params![
                    status.as_str(),
                    current_period_end.as_ref().map(format_timestamp),
                    format_timestamp(&occurred_at),
                    subscription_id,
                ],
            )
            .context("Failed to update subscription status")?;
        Ok(updated)
    }

    /// Mark the row holding `subscription_id` as cancelled.
    pub fn cancel(conn: &Connection, subscription_id: &str, occurred_at: DateTime<Utc>) -> Result<usize> {
        let updated = conn
            .execute(
                "UPDATE subscriptions SET status = ?1, updated_at = ?2 WHERE stripe_subscription_id = ?3",
                params![
                    SubscriptionStatus::Cancelled.as_str(),
                    format_timestamp(&occurred_at),
                    subscription_id,
                ],
            )
            .context("Failed to cancel subscription")?;
        Ok(updated)
    }

    pub fn get_by_user(conn: &Connection, user_id: &str) -> Result<Option<SubscriptionRecord>> {
        conn.query_row(
            &format!("SELECT {} FROM subscriptions WHERE user_id = ?1", COLUMNS),
            params![user_id],
            Self::from_row,
        )
        .optional()
        .context("Failed to query subscription by user")
    }

    pub fn get_by_subscription_id(
        conn: &Connection,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>> {
        conn.query_row(
            &format!(
                "SELECT {} FROM subscriptions WHERE stripe_subscription_id = ?1",
                COLUMNS
            ),
            params![subscription_id],
            Self::from_row,
        )
        .optional()
        .context("Failed to query subscription by provider id")
    }

    /// Most recently updated first.
    pub fn list(conn: &Connection, limit: usize) -> Result<Vec<SubscriptionRecord>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM subscriptions ORDER BY updated_at DESC LIMIT ?1",
                COLUMNS
            ))
            .context("Failed to prepare subscriptions list query")?;

        let rows = stmt
            .query_map(params![limit as i64], Self::from_row)
            .context("Failed to list subscriptions")?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<SubscriptionRecord> {
        let status: Option<String> = row.get(3)?;
        let created_at = parse_timestamp(5, Some(row.get(5)?))?.unwrap_or_default();
        let updated_at = parse_timestamp(6, Some(row.get(6)?))?.unwrap_or_default();

        Ok(SubscriptionRecord {
            user_id: row.get(0)?,
            stripe_customer_id: row.get(1)?,
            stripe_subscription_id: row.get(2)?,
            status: status.as_deref().map(SubscriptionStatus::parse),
            current_period_end: parse_timestamp(4, row.get(4)?)?,
            created_at,
            updated_at,
        })
    }
}
