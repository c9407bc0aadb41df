//! Upload phases and the shared progress handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Phase of an upload's processing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Idle,
    Uploading,
    Transcribing,
    CheckingEntitlement,
    Summarizing,
    Done,
    PaymentRequired,
    Error,
}

impl UploadPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Transcribing => "transcribing",
            Self::CheckingEntitlement => "checking_entitlement",
            Self::Summarizing => "summarizing",
            Self::Done => "done",
            Self::PaymentRequired => "payment_required",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "idle" => Self::Idle,
            "uploading" => Self::Uploading,
            "transcribing" => Self::Transcribing,
            "checking_entitlement" => Self::CheckingEntitlement,
            "summarizing" => Self::Summarizing,
            "done" => Self::Done,
            "payment_required" => Self::PaymentRequired,
            "error" => Self::Error,
            _ => return None,
        })
    }

    /// Progress percentage shown for this phase. `None` for `error`, which
    /// keeps whatever progress was reached.
    pub fn progress(&self) -> Option<u8> {
        match self {
            Self::Idle => Some(0),
            Self::Uploading => Some(10),
            Self::Transcribing => Some(30),
            Self::CheckingEntitlement => Some(60),
            Self::Summarizing => Some(75),
            Self::Done | Self::PaymentRequired => Some(100),
            Self::Error => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::PaymentRequired | Self::Error)
    }
}

#[derive(Debug, Clone)]
pub struct UploadState {
    pub phase: UploadPhase,
    pub progress: u8,
    pub upload_id: Option<i64>,
    pub file_name: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Default for UploadState {
    fn default() -> Self {
        Self {
            phase: UploadPhase::Idle,
            progress: 0,
            upload_id: None,
            file_name: None,
            started_at: None,
            last_error: None,
        }
    }
}

/// Handle for watching one upload from another task.
#[derive(Clone, Default)]
pub struct UploadStatusHandle {
    inner: Arc<Mutex<UploadState>>,
}

impl UploadStatusHandle {
    pub async fn get(&self) -> UploadState {
        self.inner.lock().await.clone()
    }

    pub async fn start(&self, upload_id: i64, file_name: &str) {
        let mut state = self.inner.lock().await;
        *state = UploadState {
            phase: UploadPhase::Uploading,
            progress: UploadPhase::Uploading.progress().unwrap_or(0),
            upload_id: Some(upload_id),
            file_name: Some(file_name.to_string()),
            started_at: Some(Utc::now()),
            last_error: None,
        };
    }

    pub async fn set_phase(&self, phase: UploadPhase) {
        let mut state = self.inner.lock().await;
        state.phase = phase;
        if let Some(progress) = phase.progress() {
            state.progress = progress;
        }
    }

    pub async fn set_error(&self, error: String) {
        let mut state = self.inner.lock().await;
        state.phase = UploadPhase::Error;
        state.last_error = Some(error);
    }

    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        *state = UploadState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_phase_as_str_round_trips() {
        for phase in [
            UploadPhase::Idle,
            UploadPhase::Uploading,
            UploadPhase::Transcribing,
            UploadPhase::CheckingEntitlement,
            UploadPhase::Summarizing,
            UploadPhase::Done,
            UploadPhase::PaymentRequired,
            UploadPhase::Error,
        ] {
            assert_eq!(UploadPhase::parse(phase.as_str()), Some(phase));
            assert_eq!(
                serde_json::to_string(&phase).unwrap(),
                format!("\"{}\"", phase.as_str())
            );
        }
        assert_eq!(UploadPhase::parse("recording"), None);
    }

    #[test]
    fn test_progress_values() {
        assert_eq!(UploadPhase::Idle.progress(), Some(0));
        assert_eq!(UploadPhase::Uploading.progress(), Some(10));
        assert_eq!(UploadPhase::Transcribing.progress(), Some(30));
        assert_eq!(UploadPhase::CheckingEntitlement.progress(), Some(60));
        assert_eq!(UploadPhase::Summarizing.progress(), Some(75));
        assert_eq!(UploadPhase::Done.progress(), Some(100));
        assert_eq!(UploadPhase::PaymentRequired.progress(), Some(100));
        assert_eq!(UploadPhase::Error.progress(), None);
    }

    #[tokio::test]
    async fn test_status_handle_lifecycle() {
        let handle = UploadStatusHandle::default();
        assert_eq!(handle.get().await.phase, UploadPhase::Idle);

        handle.start(7, "standup.mp3").await;
        let state = handle.get().await;
        assert_eq!(state.phase, UploadPhase::Uploading);
        assert_eq!(state.progress, 10);
        assert_eq!(state.upload_id, Some(7));
        assert!(state.started_at.is_some());

        handle.set_phase(UploadPhase::Transcribing).await;
        handle.set_error("backend down".to_string()).await;
        let state = handle.get().await;
        assert_eq!(state.phase, UploadPhase::Error);
        assert_eq!(state.progress, 30);
        assert_eq!(state.last_error.as_deref(), Some("backend down"));

        handle.reset().await;
        assert!(handle.get().await.upload_id.is_none());
    }
}
