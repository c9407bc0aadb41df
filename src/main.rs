use anyhow::Result;
use clap::Parser;
use meetnotes::{
    app,
    cli::{handle_entitlement_command, handle_subscriptions_command, handle_upload_command, Cli, CliCommand},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(CliCommand::Version) => {
            println!("meetnotes {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(CliCommand::Entitlement(args)) => {
            handle_entitlement_command(args).await?;
            return Ok(());
        }
        Some(CliCommand::Upload(args)) => {
            handle_upload_command(args).await?;
            return Ok(());
        }
        Some(CliCommand::Subscriptions(args)) => {
            handle_subscriptions_command(args).await?;
            return Ok(());
        }
        Some(CliCommand::Serve) | None => {}
    }

    app::run_service().await
}
