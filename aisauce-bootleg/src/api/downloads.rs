//! Download API handlers
//!
//! POST /downloads, GET /downloads, GET /downloads/:id

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db,
    error::{ApiError, ApiResult},
    models::{DownloadRecord, DownloadStatus},
    AppState,
};

const DEFAULT_LIST_LIMIT: u32 = 50;
const MAX_LIST_LIMIT: u32 = 500;

/// POST /downloads request
#[derive(Debug, Deserialize)]
pub struct CreateDownloadRequest {
    /// One or more URLs separated by whitespace
    pub url: String,
    #[serde(default)]
    pub callback_url: Option<String>,
}

/// POST /downloads response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateDownloadResponse {
    pub id: Uuid,
    pub status: DownloadStatus,
    pub title: String,
    pub total_tracks: usize,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

/// POST /downloads
///
/// Queue a download. Returns 202 Accepted with the download ID.
pub async fn create_download(
    State(state): State<AppState>,
    Json(request): Json<CreateDownloadRequest>,
) -> ApiResult<(StatusCode, Json<CreateDownloadResponse>)> {
    let mut record = DownloadRecord::new(&request.url, request.callback_url);
    if record.urls.is_empty() {
        return Err(ApiError::BadRequest("No URL given".to_string()));
    }

    db::save_download(&state.db, &record).await?;

    let response = CreateDownloadResponse {
        id: record.id,
        status: record.status,
        title: record.title.clone(),
        total_tracks: record.total_tracks,
    };

    if let Err(e) = state.queue.submit(record.clone()) {
        // Rejected jobs never run; close them out as failed
        tracing::warn!(download_id = %record.id, error = %e, "Download rejected");
        record.abort(&e.to_string());
        db::save_download(&state.db, &record).await?;
        return Err(e.into());
    }

    tracing::info!(download_id = %record.id, tracks = record.total_tracks, "Download queued");

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// GET /downloads
pub async fn list_downloads(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<DownloadRecord>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let records = db::list_downloads(&state.db, limit).await?;
    Ok(Json(records))
}

/// GET /downloads/:id
pub async fn get_download(
    State(state): State<AppState>,
    Path(download_id): Path<Uuid>,
) -> ApiResult<Json<DownloadRecord>> {
    db::load_download(&state.db, download_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Download {}", download_id)))
}

/// Build download routes
pub fn download_routes() -> Router<AppState> {
    Router::new()
        .route("/downloads", get(list_downloads).post(create_download))
        .route("/downloads/:id", get(get_download))
}
