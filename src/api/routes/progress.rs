//! Progress handler: one server-sent event stream per job.

use crate::api::AppState;
use crate::types::MediaId;
use axum::{
    extract::{Path, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use std::convert::Infallible;
use tokio_stream::StreamExt;

/// GET /progress/:id - Server-sent progress events
///
/// Each event's `data` is a JSON progress unit
/// `{ progress, totalSize, downloaded, status }`. Units arrive once per
/// progress interval while the job downloads; the terminal unit is sent as
/// soon as the job finishes and then the stream ends. Nothing is sent until a
/// job for the id exists. Disconnecting never affects the download.
#[utoipa::path(
    get,
    path = "/progress/{id}",
    tag = "progress",
    params(
        ("id" = String, Path, description = "Media ID")
    ),
    responses(
        (status = 200, description = "Progress events (text/event-stream), each carrying a ProgressUpdate", content_type = "text/event-stream")
    )
)]
pub async fn progress_stream(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    tracing::debug!(media_id = %id, "Progress subscriber connected");
    let snapshots = state.downloader.subscribe_progress(MediaId::new(id));

    let sse_stream = snapshots.filter_map(|snapshot| {
        match serde_json::to_string(&snapshot.to_update()) {
            Ok(json_data) => Some(Ok(SseEvent::default().data(json_data))),
            Err(e) => {
                tracing::warn!(media_id = %snapshot.id, error = %e, "Failed to serialize progress update");
                None
            }
        }
    });

    Sse::new(sse_stream).keep_alive(KeepAlive::default())
}
