//! CLI handler for uploading a meeting recording.
//!
//! Runs the same flow as `POST /api/uploads` and renders its phases as a
//! progress bar.

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::app::Services;
use crate::cli::args::{OutputFormat, UploadCliArgs};
use crate::upload::{audio_content_type, UploadOutcome, UploadPhase, UploadStatusHandle};

pub async fn handle_upload_command(args: UploadCliArgs) -> Result<()> {
    let file_name = file_name(&args.file)?;
    if audio_content_type(&file_name, None).is_none() {
        bail!("Unsupported file type: {} (expected an audio file)", file_name);
    }

    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {:?}", args.file))?;

    let services = Services::build()?;
    let user = services.query.resolve_user(&args.token).await?;

    let status = UploadStatusHandle::default();
    let pb = if args.no_progress {
        None
    } else {
        Some(create_progress_bar())
    };
    let watcher = pb.clone().map(|pb| spawn_progress_watcher(status.clone(), pb));

    let result = services
        .uploads
        .process(&args.token, &user, &file_name, None, bytes, &status)
        .await;

    if let Some(watcher) = watcher {
        watcher.abort();
    }

    let outcome = match result {
        Ok(outcome) => {
            if let Some(pb) = &pb {
                pb.set_position(100);
                pb.finish_with_message(phase_message(outcome.phase));
            }
            outcome
        }
        Err(e) => {
            if let Some(pb) = &pb {
                pb.abandon_with_message("Failed");
            }
            return Err(e.into());
        }
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => print_outcome(&outcome),
    }

    Ok(())
}

fn file_name(path: &Path) -> Result<String> {
    if !path.is_file() {
        bail!("File not found: {:?}", path);
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .context("File name is not valid UTF-8")
}

fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}% {msg}")
    {
        pb.set_style(style.progress_chars("━╸━"));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn spawn_progress_watcher(status: UploadStatusHandle, pb: ProgressBar) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let state = status.get().await;
            pb.set_position(state.progress as u64);
            pb.set_message(phase_message(state.phase));
            if state.phase.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    })
}

fn phase_message(phase: UploadPhase) -> &'static str {
    match phase {
        UploadPhase::Idle => "Waiting...",
        UploadPhase::Uploading => "Uploading...",
        UploadPhase::Transcribing => "Transcribing...",
        UploadPhase::CheckingEntitlement => "Checking plan...",
        UploadPhase::Summarizing => "Summarizing...",
        UploadPhase::Done => "Complete",
        UploadPhase::PaymentRequired => "Upgrade required for summary",
        UploadPhase::Error => "Failed",
    }
}

fn print_outcome(outcome: &UploadOutcome) {
    println!("Upload #{} (meeting {})", outcome.upload_id, outcome.meeting_id);

    if let Some(transcript) = &outcome.transcript {
        println!("\nTranscript:\n{}", transcript);
    }

    match (&outcome.summary, outcome.phase) {
        (Some(summary), _) => println!("\nSummary:\n{}", summary.summary_text),
        (None, UploadPhase::PaymentRequired) => {
            let used = outcome
                .entitlement
                .map(|e| e.summaries_count)
                .unwrap_or_default();
            println!(
                "\nYou've used your free summary ({} generated). Subscribe to keep summarizing;",
                used
            );
            println!("the transcript above has been saved.");
        }
        (None, _) => println!("\nAutomatic summaries are off; transcript saved."),
    }
}
