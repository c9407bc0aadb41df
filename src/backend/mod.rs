//! Client for the transcription/summarization backend.

pub mod client;
pub mod types;

pub use client::HttpBackendClient;
pub use types::{
    AudioFile, ChatMessage, ChatRole, DetailLevel, Preferences, RefineRequest, RefineResponse,
    SummarizeRequest, SummarizeResponse, SummaryFormat, SummaryList, TranscribeResponse,
};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend rejected credentials")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Backend request failed: {0}")]
    Transport(String),
    #[error("Malformed backend response: {0}")]
    Decode(String),
}

/// Every call carries the caller's bearer token; the backend scopes data by it.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn get_preferences(&self, token: &str) -> Result<Preferences, BackendError>;

    async fn save_preferences(
        &self,
        token: &str,
        prefs: &Preferences,
    ) -> Result<serde_json::Value, BackendError>;

    async fn transcribe(&self, token: &str, audio: AudioFile) -> Result<TranscribeResponse, BackendError>;

    async fn summarize(
        &self,
        token: &str,
        request: &SummarizeRequest,
    ) -> Result<SummarizeResponse, BackendError>;

    async fn list_summaries(&self, token: &str) -> Result<SummaryList, BackendError>;

    async fn delete_summary(&self, token: &str, summary_id: &str) -> Result<(), BackendError>;

    async fn refine_summary(
        &self,
        token: &str,
        request: &RefineRequest,
    ) -> Result<RefineResponse, BackendError>;

    async fn count_summaries(&self, token: &str) -> Result<usize, BackendError> {
        Ok(self.list_summaries(token).await?.summaries.len())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// In-memory backend. Summaries created through `summarize` are counted.
    #[derive(Default)]
    pub struct FakeBackend {
        pub summaries: Mutex<Vec<serde_json::Value>>,
        pub preferences: Mutex<Option<Preferences>>,
        pub fail_summaries: bool,
        pub fail_transcribe: bool,
        pub next_id: Mutex<u32>,
    }

    impl FakeBackend {
        pub fn with_summaries(count: usize) -> Self {
            let backend = Self::default();
            if let Ok(mut summaries) = backend.summaries.lock() {
                for i in 0..count {
                    summaries.push(serde_json::json!({ "id": format!("existing-{}", i) }));
                }
            }
            backend
        }

        fn next(&self, prefix: &str) -> String {
            let mut id = self.next_id.lock().unwrap();
            *id += 1;
            format!("{}-{}", prefix, id)
        }
    }

    #[async_trait]
    impl BackendApi for FakeBackend {
        async fn get_preferences(&self, _token: &str) -> Result<Preferences, BackendError> {
            self.preferences
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| BackendError::NotFound("no preferences".to_string()))
        }

        async fn save_preferences(
            &self,
            _token: &str,
            prefs: &Preferences,
        ) -> Result<serde_json::Value, BackendError> {
            *self.preferences.lock().unwrap() = Some(prefs.clone());
            Ok(serde_json::json!({ "message": "Preferences saved" }))
        }

        async fn transcribe(
            &self,
            _token: &str,
            audio: AudioFile,
        ) -> Result<TranscribeResponse, BackendError> {
            if self.fail_transcribe {
                return Err(BackendError::Status {
                    status: 500,
                    message: "Transcription failed".to_string(),
                });
            }
            Ok(TranscribeResponse {
                meeting_id: self.next("meeting"),
                transcript_id: Some(self.next("transcript")),
                language: Some("en".to_string()),
                text: Some(format!("transcript of {}", audio.file_name)),
            })
        }

        async fn summarize(
            &self,
            _token: &str,
            request: &SummarizeRequest,
        ) -> Result<SummarizeResponse, BackendError> {
            let summary_id = self.next("summary");
            self.summaries
                .lock()
                .unwrap()
                .push(serde_json::json!({ "id": summary_id, "meeting_id": request.meeting_id }));
            Ok(SummarizeResponse {
                summary_id,
                meeting_id: request.meeting_id.clone(),
                summary_text: "summary".to_string(),
                generation_time_seconds: None,
            })
        }

        async fn list_summaries(&self, _token: &str) -> Result<SummaryList, BackendError> {
            if self.fail_summaries {
                return Err(BackendError::Transport("connection refused".to_string()));
            }
            Ok(SummaryList {
                summaries: self.summaries.lock().unwrap().clone(),
            })
        }

        async fn delete_summary(&self, _token: &str, summary_id: &str) -> Result<(), BackendError> {
            let mut summaries = self.summaries.lock().unwrap();
            let before = summaries.len();
            summaries.retain(|s| s["id"] != summary_id);
            if summaries.len() == before {
                return Err(BackendError::NotFound("Summary not found".to_string()));
            }
            Ok(())
        }

        async fn refine_summary(
            &self,
            _token: &str,
            request: &RefineRequest,
        ) -> Result<RefineResponse, BackendError> {
            Ok(RefineResponse {
                assistant_message: format!("Noted: {}", request.user_message),
                is_summary_updated: false,
                updated_summary: None,
            })
        }
    }
}
