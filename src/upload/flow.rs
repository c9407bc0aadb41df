//! Upload processing orchestrator.
//!
//! uploading → transcribing → checking_entitlement → summarizing → done,
//! with `payment_required` when the gate refuses and `error` from any step.
//! The transcript is stored before the gate runs, so a refusal keeps it.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::auth::AuthUser;
use crate::backend::{
    AudioFile, BackendApi, BackendError, Preferences, SummarizeRequest, SummarizeResponse,
};
use crate::db::{Database, UploadRepository};
use crate::entitlement::{Entitlement, EntitlementGate};

use super::audio::audio_content_type;
use super::status::{UploadPhase, UploadStatusHandle};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please upload an audio file")]
    NotAudio,
    #[error("Uploaded file is empty")]
    Empty,
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("Failed to store upload: {0:#}")]
    Storage(#[from] anyhow::Error),
}

/// Where an upload ended up. `phase` is `done` or `payment_required`.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub upload_id: i64,
    pub phase: UploadPhase,
    pub meeting_id: String,
    pub transcript: Option<String>,
    pub language: Option<String>,
    pub summary: Option<SummarizeResponse>,
    pub entitlement: Option<Entitlement>,
}

#[derive(Clone)]
pub struct UploadFlow {
    backend: Arc<dyn BackendApi>,
    gate: EntitlementGate,
    db: Database,
}

impl UploadFlow {
    pub fn new(backend: Arc<dyn BackendApi>, gate: EntitlementGate, db: Database) -> Self {
        Self { backend, gate, db }
    }

    pub async fn process(
        &self,
        token: &str,
        user: &AuthUser,
        file_name: &str,
        declared_type: Option<&str>,
        bytes: Vec<u8>,
        status: &UploadStatusHandle,
    ) -> Result<UploadOutcome, UploadError> {
        let content_type = audio_content_type(file_name, declared_type).ok_or(UploadError::NotAudio)?;
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }

        let upload_id = {
            let user_id = user.id.clone();
            let name = file_name.to_string();
            self.db
                .call(move |conn| UploadRepository::insert(conn, &user_id, &name))
                .await?
        };
        status.start(upload_id, file_name).await;
        info!(upload_id, user_id = %user.id, "Upload {} received ({} bytes)", file_name, bytes.len());

        let audio = AudioFile {
            file_name: file_name.to_string(),
            content_type,
            bytes,
        };

        match self.run(token, upload_id, audio, status).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(upload_id, "Upload processing failed: {}", e);
                let message = e.to_string();
                status.set_error(message.clone()).await;
                if let Err(db_err) = self
                    .db
                    .call(move |conn| UploadRepository::fail(conn, upload_id, &message))
                    .await
                {
                    warn!(upload_id, "Failed to record upload error: {:#}", db_err);
                }
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        token: &str,
        upload_id: i64,
        audio: AudioFile,
        status: &UploadStatusHandle,
    ) -> Result<UploadOutcome, UploadError> {
        self.advance(upload_id, UploadPhase::Transcribing, status).await?;
        let transcript = self.backend.transcribe(token, audio).await?;
        {
            let meeting_id = transcript.meeting_id.clone();
            let text = transcript.text.clone().unwrap_or_default();
            self.db
                .call(move |conn| UploadRepository::record_transcript(conn, upload_id, &meeting_id, &text))
                .await?;
        }
        info!(upload_id, meeting_id = %transcript.meeting_id, "Transcription complete");

        let prefs = match self.backend.get_preferences(token).await {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(upload_id, "Using default preferences: {}", e);
                Preferences::default()
            }
        };

        let mut outcome = UploadOutcome {
            upload_id,
            phase: UploadPhase::Done,
            meeting_id: transcript.meeting_id.clone(),
            transcript: transcript.text,
            language: transcript.language,
            summary: None,
            entitlement: None,
        };

        if !prefs.auto_generate_summary {
            info!(upload_id, "Automatic summaries disabled; keeping transcript only");
            self.finish(upload_id, UploadPhase::Done, None, status).await?;
            return Ok(outcome);
        }

        self.advance(upload_id, UploadPhase::CheckingEntitlement, status)
            .await?;
        let entitlement = self.gate.check(token).await;
        outcome.entitlement = Some(entitlement);

        if !entitlement.can_generate {
            info!(
                upload_id,
                summaries_count = entitlement.summaries_count,
                "Summary quota used; payment required"
            );
            self.finish(upload_id, UploadPhase::PaymentRequired, None, status)
                .await?;
            outcome.phase = UploadPhase::PaymentRequired;
            return Ok(outcome);
        }

        self.advance(upload_id, UploadPhase::Summarizing, status).await?;
        let request = SummarizeRequest::from_preferences(&outcome.meeting_id, &prefs);
        let summary = self.backend.summarize(token, &request).await?;

        self.finish(
            upload_id,
            UploadPhase::Done,
            Some(summary.summary_id.clone()),
            status,
        )
        .await?;
        info!(upload_id, summary_id = %summary.summary_id, "Summary generated");
        outcome.summary = Some(summary);
        Ok(outcome)
    }

    async fn advance(
        &self,
        upload_id: i64,
        phase: UploadPhase,
        status: &UploadStatusHandle,
    ) -> Result<(), UploadError> {
        self.db
            .call(move |conn| UploadRepository::update_phase(conn, upload_id, phase))
            .await?;
        status.set_phase(phase).await;
        Ok(())
    }

    async fn finish(
        &self,
        upload_id: i64,
        phase: UploadPhase,
        summary_id: Option<String>,
        status: &UploadStatusHandle,
    ) -> Result<(), UploadError> {
        self.db
            .call(move |conn| UploadRepository::finish(conn, upload_id, phase, summary_id.as_deref()))
            .await?;
        status.set_phase(phase).await;
        Ok(())
    }
}
