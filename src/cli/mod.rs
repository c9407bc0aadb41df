pub mod args;
pub mod subscriptions;
pub mod upload;

pub use args::{Cli, CliCommand};
pub use subscriptions::handle_subscriptions_command;
pub use upload::handle_upload_command;

use anyhow::Result;

use crate::app::Services;
use args::EntitlementCliArgs;

pub async fn handle_entitlement_command(args: EntitlementCliArgs) -> Result<()> {
    let services = Services::build()?;
    let user = services.query.resolve_user(&args.token).await?;
    let entitlement = services.gate.check(&args.token).await;

    println!("User: {}", user.id);
    println!("Subscribed: {}", if entitlement.is_subscribed { "yes" } else { "no" });
    println!("Summaries generated: {}", entitlement.summaries_count);
    println!(
        "Can generate: {}",
        if entitlement.can_generate { "yes" } else { "no" }
    );

    if let Some(record) = services.store.get_by_user(&user.id).await? {
        if let Some(end) = record.current_period_end {
            println!("Period end: {}", end.to_rfc3339());
        }
    }

    Ok(())
}
