//! Download pipeline: the single task that owns one job's writer and sink.
//!
//! Phases:
//! 1. Open the provider stream and record the announced size
//! 2. Append chunks to the sink, reporting cumulative bytes after each one
//! 3. Commit the artifact and mark the job `completed`
//!
//! Any failure (stream error, stall, write error, shutdown) deletes the partial
//! file first and only then marks the job `failed`, so an observer that sees
//! `failed` never finds a half-written artifact on disk.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::artifact_store::ArtifactSink;
use crate::error::{DownloadError, Error};
use crate::provider::MediaProvider;
use crate::registry::JobWriter;
use crate::types::JobStatus;

/// Everything one pipeline needs, moved into its task
pub(crate) struct PipelineContext {
    pub(crate) url: String,
    pub(crate) provider: Arc<dyn MediaProvider>,
    pub(crate) writer: JobWriter,
    pub(crate) idle_timeout: Option<Duration>,
    pub(crate) cancel: CancellationToken,
    pub(crate) serial: u64,
    pub(crate) active_downloads: Arc<
        tokio::sync::Mutex<std::collections::HashMap<u64, CancellationToken>>,
    >,
}

impl PipelineContext {
    /// Drop this pipeline from the active set
    async fn remove_from_active(&self) {
        self.active_downloads.lock().await.remove(&self.serial);
    }
}

/// Run one download to its terminal state
///
/// Returns the terminal status that was published.
pub(crate) async fn run_pipeline(ctx: PipelineContext, mut sink: ArtifactSink) -> JobStatus {
    let id = ctx.writer.id().clone();
    tracing::info!(media_id = %id, provider = ctx.provider.name(), "Download started");

    let streamed = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => Err(DownloadError::Cancelled),
        result = stream_into(&ctx, &mut sink) => result,
    };

    let status = match streamed {
        Ok(()) => match sink.commit().await {
            Ok(bytes) => {
                ctx.writer.mark_terminal(JobStatus::Completed);
                tracing::info!(media_id = %id, bytes, "Download completed");
                JobStatus::Completed
            }
            Err(e) => {
                // commit consumed the sink; its drop already removed the partial file
                tracing::error!(media_id = %id, error = %e, "Failed to commit artifact");
                ctx.writer.mark_terminal(JobStatus::Failed);
                JobStatus::Failed
            }
        },
        Err(e) => {
            let written = sink.written();
            if let Err(cleanup) = sink.abort().await {
                tracing::warn!(media_id = %id, error = %cleanup, "Failed to remove partial artifact");
            }
            ctx.writer.mark_terminal(JobStatus::Failed);
            match e {
                DownloadError::Cancelled => {
                    tracing::info!(media_id = %id, written, "Download cancelled")
                }
                other => tracing::error!(media_id = %id, written, error = %other, "Download failed"),
            }
            JobStatus::Failed
        }
    };

    ctx.remove_from_active().await;
    status
}

async fn stream_into(ctx: &PipelineContext, sink: &mut ArtifactSink) -> Result<(), DownloadError> {
    // the idle deadline also covers the provider answering at all
    let opening = ctx.provider.open_stream(&ctx.url);
    let opened = match ctx.idle_timeout {
        Some(limit) => tokio::time::timeout(limit, opening)
            .await
            .map_err(|_| DownloadError::Stalled(limit))?,
        None => opening.await,
    };
    let stream = opened.map_err(|e| DownloadError::Stream(diagnostic(e)))?;

    let total_size = stream.content_length.unwrap_or(0);
    if total_size > 0 {
        ctx.writer.set_total_size(total_size);
    }
    tracing::debug!(media_id = %ctx.writer.id(), total_size, "Media stream opened");

    let mut chunks = stream.chunks;
    loop {
        let next = match ctx.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, chunks.next())
                .await
                .map_err(|_| DownloadError::Stalled(limit))?,
            None => chunks.next().await,
        };

        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk.map_err(|e| DownloadError::Stream(e.to_string()))?;

        sink.write_chunk(&chunk)
            .await
            .map_err(|e| DownloadError::Write(e.to_string()))?;
        let written = sink.written();
        // an understated Content-Length grows with the bytes actually received
        let total = if total_size > 0 { total_size.max(written) } else { 0 };
        ctx.writer.update_progress(written, total);
    }

    Ok(())
}

fn diagnostic(error: Error) -> String {
    match error {
        Error::UpstreamUnavailable { detail } => detail,
        other => other.to_string(),
    }
}
