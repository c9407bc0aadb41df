use anyhow::{anyhow, Result};

use super::args::{SubscriptionsCliArgs, SubscriptionsCommand};
use crate::db::{Database, SubscriptionRepository};
use crate::subscription::SubscriptionRecord;

pub async fn handle_subscriptions_command(args: SubscriptionsCliArgs) -> Result<()> {
    let db = Database::open_default()?;

    match args.command {
        SubscriptionsCommand::List { limit } => {
            let records = db
                .call(move |conn| SubscriptionRepository::list(conn, limit))
                .await?;

            if records.is_empty() {
                println!("No subscriptions recorded yet.");
                return Ok(());
            }

            println!("Found {} subscription(s):\n", records.len());
            for record in &records {
                print_record(record);
                println!("---");
            }
        }
        SubscriptionsCommand::Show { user_id } => {
            let lookup = user_id.clone();
            let record = db
                .call(move |conn| SubscriptionRepository::get_by_user(conn, &lookup))
                .await?
                .ok_or_else(|| anyhow!("No subscription for user {}", user_id))?;
            print_record(&record);
        }
    }

    Ok(())
}

fn print_record(record: &SubscriptionRecord) {
    let now = chrono::Utc::now();
    println!("User: {}", record.user_id);
    println!(
        "Status: {}{}",
        record
            .status
            .as_ref()
            .map(|s| s.as_str())
            .unwrap_or("(none)"),
        if record.is_active_at(now) { " [entitled]" } else { "" }
    );
    if let Some(end) = record.current_period_end {
        println!("Period end: {}", end.to_rfc3339());
    }
    if let Some(customer) = &record.stripe_customer_id {
        println!("Customer: {}", customer);
    }
    if let Some(subscription) = &record.stripe_subscription_id {
        println!("Subscription: {}", subscription);
    }
    println!("Updated: {}", record.updated_at.to_rfc3339());
}
