//! Upload API routes.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use super::bearer;
use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::db::{UploadRecord, UploadRepository};
use crate::upload::{UploadOutcome, UploadPhase, UploadStatusHandle};

#[derive(Debug, Deserialize, Default)]
pub struct UploadListParams {
    /// Maximum results (default 50)
    pub limit: Option<usize>,
}

/// An upload record plus its progress percentage.
#[derive(Debug, Serialize)]
pub struct UploadView {
    #[serde(flatten)]
    pub record: UploadRecord,
    pub progress: Option<u8>,
}

impl From<UploadRecord> for UploadView {
    fn from(record: UploadRecord) -> Self {
        let progress = UploadPhase::parse(&record.phase).and_then(|p| p.progress());
        Self { record, progress }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/uploads", get(list_uploads).post(create_upload))
        .route("/uploads/:id", get(get_upload))
}

/// POST /api/uploads - Transcribe an audio file and summarize it if allowed.
async fn create_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadOutcome>> {
    let token = bearer(&headers)?;
    let user = state.query.resolve_user(token).await?;

    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;
        file = Some((file_name, content_type, bytes.to_vec()));
        break;
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| ApiError::bad_request("Missing 'file' field"))?;

    let outcome = state
        .uploads
        .process(
            token,
            &user,
            &file_name,
            content_type.as_deref(),
            bytes,
            &UploadStatusHandle::default(),
        )
        .await?;

    Ok(Json(outcome))
}

/// GET /api/uploads - List the caller's uploads, newest first.
async fn list_uploads(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<UploadListParams>,
) -> ApiResult<Json<Vec<UploadView>>> {
    let token = bearer(&headers)?;
    let user = state.query.resolve_user(token).await?;
    let limit = params.limit.unwrap_or(50);

    let records = state
        .db
        .call(move |conn| UploadRepository::list(conn, &user.id, limit))
        .await?;

    Ok(Json(records.into_iter().map(UploadView::from).collect()))
}

/// GET /api/uploads/:id - One of the caller's uploads.
async fn get_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<UploadView>> {
    let token = bearer(&headers)?;
    let user = state.query.resolve_user(token).await?;

    let record = state
        .db
        .call(move |conn| UploadRepository::get(conn, &user.id, id))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Upload {} not found", id)))?;

    Ok(Json(record.into()))
}
