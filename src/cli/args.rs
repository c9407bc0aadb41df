use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "meetnotes")]
#[command(about = "Meeting transcription and summaries, with billing", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the HTTP API server (default when no command is given)
    Serve,
    /// Print version information
    Version,
    /// Check whether a user may generate a summary
    Entitlement(EntitlementCliArgs),
    /// Upload an audio file and run it through transcription and summary
    Upload(UploadCliArgs),
    /// Inspect locally stored subscription records
    Subscriptions(SubscriptionsCliArgs),
}

#[derive(ClapArgs, Debug)]
pub struct EntitlementCliArgs {
    /// Bearer token of the user to check
    #[arg(short, long)]
    pub token: String,
}

#[derive(ClapArgs, Debug)]
pub struct UploadCliArgs {
    /// Path to the audio file
    pub file: PathBuf,
    /// Bearer token of the uploading user
    #[arg(short, long)]
    pub token: String,
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(ClapArgs, Debug)]
pub struct SubscriptionsCliArgs {
    #[command(subcommand)]
    pub command: SubscriptionsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SubscriptionsCommand {
    /// List subscription records, most recently updated first
    List {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show the record for one user
    Show {
        /// User id
        user_id: String,
    },
}
