//! Download request and job inspection handlers.

use super::DownloadRequest;
use crate::api::AppState;
use crate::error::{Error, Result};
use crate::types::{DownloadResponse, JobSnapshot, MediaId};
use axum::{
    Json,
    extract::{Path, State},
};

/// POST /download - Start (or join) a download
///
/// Answers as soon as the job is registered; the transfer continues in the
/// background and is observable via `GET /progress/{id}`.
#[utoipa::path(
    post,
    path = "/download",
    tag = "downloads",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "Download started, joined or already on disk", body = DownloadResponse),
        (status = 400, description = "Missing or unsupported URL", body = crate::error::ApiError),
        (status = 502, description = "Media provider unavailable", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn start_download(
    State(state): State<AppState>,
    payload: Option<Json<DownloadRequest>>,
) -> Result<Json<DownloadResponse>> {
    // an absent or unparsable body is treated like a missing URL
    let url = payload
        .and_then(|Json(request)| request.url)
        .unwrap_or_default();

    let response = state.downloader.request_download(&url).await?;
    Ok(Json(response))
}

/// GET /jobs/:id - Current snapshot of a job
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    tag = "downloads",
    params(
        ("id" = String, Path, description = "Media ID")
    ),
    responses(
        (status = 200, description = "Job snapshot", body = JobSnapshot),
        (status = 404, description = "No job for this media ID", body = crate::error::ApiError)
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobSnapshot>> {
    state
        .downloader
        .job(&MediaId::new(id.clone()))
        .map(Json)
        .ok_or_else(|| Error::NotFound(format!("job {id}")))
}

/// GET /jobs - All jobs seen by this process
#[utoipa::path(
    get,
    path = "/jobs",
    tag = "downloads",
    responses(
        (status = 200, description = "Job snapshots", body = Vec<JobSnapshot>)
    )
)]
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobSnapshot>> {
    let mut jobs = state.downloader.jobs();
    jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Json(jobs)
}
