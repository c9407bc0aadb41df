//! reqwest implementation of [`BackendApi`].

use async_trait::async_trait;
use reqwest::{multipart, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{
    AudioFile, BackendApi, BackendError, Preferences, RefineRequest, RefineResponse,
    SummarizeRequest, SummarizeResponse, SummaryList, TranscribeResponse,
};

/// Error body shape the backend uses (`{"detail": "..."}`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

pub struct HttpBackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackendClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(ErrorBody {
                detail: serde_json::Value::String(s),
            }) => s,
            Ok(ErrorBody { detail }) => detail.to_string(),
            Err(_) => text,
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(BackendError::Unauthorized),
            StatusCode::NOT_FOUND => Err(BackendError::NotFound(message)),
            _ => {
                warn!("Backend returned {}: {}", status, message);
                Err(BackendError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl BackendApi for HttpBackendClient {
    async fn get_preferences(&self, token: &str) -> Result<Preferences, BackendError> {
        self.json(self.client.get(self.url("/preferences")).bearer_auth(token))
            .await
    }

    async fn save_preferences(
        &self,
        token: &str,
        prefs: &Preferences,
    ) -> Result<serde_json::Value, BackendError> {
        self.json(
            self.client
                .post(self.url("/preferences"))
                .bearer_auth(token)
                .json(prefs),
        )
        .await
    }

    async fn transcribe(&self, token: &str, audio: AudioFile) -> Result<TranscribeResponse, BackendError> {
        debug!(
            "Uploading {} ({} bytes) for transcription",
            audio.file_name,
            audio.bytes.len()
        );

        let part = multipart::Part::bytes(audio.bytes)
            .file_name(audio.file_name)
            .mime_str(&audio.content_type)
            .map_err(|e| BackendError::Transport(format!("invalid content type: {}", e)))?;
        let form = multipart::Form::new().part("file", part);

        self.json(
            self.client
                .post(self.url("/transcribe"))
                .bearer_auth(token)
                .multipart(form),
        )
        .await
    }

    async fn summarize(
        &self,
        token: &str,
        request: &SummarizeRequest,
    ) -> Result<SummarizeResponse, BackendError> {
        self.json(
            self.client
                .post(self.url("/summarize"))
                .bearer_auth(token)
                .json(request),
        )
        .await
    }

    async fn list_summaries(&self, token: &str) -> Result<SummaryList, BackendError> {
        self.json(self.client.get(self.url("/summaries")).bearer_auth(token))
            .await
    }

    async fn delete_summary(&self, token: &str, summary_id: &str) -> Result<(), BackendError> {
        self.send(
            self.client
                .delete(self.url(&format!("/summaries/{}", summary_id)))
                .bearer_auth(token),
        )
        .await?;
        Ok(())
    }

    async fn refine_summary(
        &self,
        token: &str,
        request: &RefineRequest,
    ) -> Result<RefineResponse, BackendError> {
        self.json(
            self.client
                .post(self.url("/refine-summary"))
                .bearer_auth(token)
                .json(request),
        )
        .await
    }
}
