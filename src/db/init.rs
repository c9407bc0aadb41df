use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn migrate(conn: &Connection) -> Result<()> {
    // One row per user, written only by the billing webhook.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS subscriptions (
            user_id TEXT PRIMARY KEY,
            stripe_customer_id TEXT,
            stripe_subscription_id TEXT,
            status TEXT,
            current_period_end TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )
    .context("Failed to create subscriptions table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_stripe_subscription_id \
         ON subscriptions(stripe_subscription_id)",
        [],
    )
    .context("Failed to create subscriptions index")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS uploads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            file_name TEXT NOT NULL,
            phase TEXT NOT NULL DEFAULT 'uploading',
            meeting_id TEXT,
            transcript_text TEXT,
            summary_id TEXT,
            error TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            completed_at TIMESTAMP
        )",
        [],
    )
    .context("Failed to create uploads table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_uploads_user_created ON uploads(user_id, created_at DESC)",
        [],
    )
    .context("Failed to create uploads index")?;

    Ok(())
}
