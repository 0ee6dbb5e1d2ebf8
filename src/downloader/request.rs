//! Download requests: validate, resolve, deduplicate, start.

use std::sync::atomic::Ordering;

use crate::artifact_store::ArtifactSink;
use crate::error::{Error, Result};
use crate::registry::{JobWriter, Registration};
use crate::resolver::ResolvedMedia;
use crate::types::{DownloadResponse, JobStatus};
use crate::validation;

use super::MediaDownloader;
use super::pipeline::{PipelineContext, run_pipeline};

impl MediaDownloader {
    /// Request a download of `url`
    ///
    /// Order of checks:
    /// 1. The URL must be a supported media URL (`InvalidInput` otherwise)
    /// 2. Metadata is resolved (`UpstreamUnavailable` on any provider failure)
    /// 3. A finished artifact on disk answers `completed` without creating a job
    /// 4. A live or completed job for the same id answers with its status
    /// 5. Otherwise a job is registered and its pipeline spawned; the response
    ///    says `downloading` and is returned before any byte is transferred
    ///
    /// # Errors
    ///
    /// - [`Error::ShuttingDown`] once [`shutdown`](Self::shutdown) has begun
    /// - [`Error::InvalidInput`] for a missing or unsupported URL
    /// - [`Error::UpstreamUnavailable`] when metadata cannot be resolved
    /// - [`Error::Io`] when the artifact cannot be opened for writing
    pub async fn request_download(&self, url: &str) -> Result<DownloadResponse> {
        if !self.active.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let url = url.trim();
        if url.is_empty() {
            return Err(Error::InvalidInput("a media URL is required".into()));
        }
        if !validation::validate(url) {
            tracing::debug!(url, "Rejected unsupported media URL");
            return Err(Error::InvalidInput("unsupported media URL".into()));
        }

        let ResolvedMedia {
            metadata,
            file_name,
        } = self.resolver.resolve(url).await?;
        let file_path = self.store.public_path(&file_name);

        if self.store.exists(&file_name).await {
            tracing::info!(media_id = %metadata.id, file_name, "Artifact already on disk");
            return Ok(DownloadResponse::new(
                metadata,
                JobStatus::Completed,
                file_path,
            ));
        }

        let writer = match self.registry.create(metadata.id.clone(), file_path.clone()) {
            Registration::Created(writer) => writer,
            Registration::Existing(job) => {
                tracing::debug!(media_id = %job.id, status = job.status.as_str(), "Joining existing job");
                return Ok(DownloadResponse::new(metadata, job.status, job.file_path));
            }
        };

        let sink = match self.store.create_sink(&file_name).await {
            Ok(sink) => sink,
            Err(e) => {
                tracing::error!(media_id = %metadata.id, error = %e, "Failed to open artifact for writing");
                writer.mark_terminal(JobStatus::Failed);
                return Err(e);
            }
        };

        self.start_pipeline(url, writer, sink).await;

        Ok(DownloadResponse::new(
            metadata,
            JobStatus::Downloading,
            file_path,
        ))
    }

    /// Spawn the pipeline task that owns `writer` and `sink`
    async fn start_pipeline(&self, url: &str, writer: JobWriter, sink: ArtifactSink) {
        let serial = self.active.next_serial.fetch_add(1, Ordering::SeqCst);
        let cancel = tokio_util::sync::CancellationToken::new();

        {
            let mut active = self.active.tokens.lock().await;
            active.insert(serial, cancel.clone());
            // shutdown may have swept the active set between our accept check and here
            if !self.active.accepting_new.load(Ordering::SeqCst) {
                cancel.cancel();
            }
        }

        let ctx = PipelineContext {
            url: url.to_string(),
            provider: self.provider.clone(),
            writer,
            idle_timeout: self.config.download.idle_timeout,
            cancel,
            serial,
            active_downloads: self.active.tokens.clone(),
        };

        tokio::spawn(run_pipeline(ctx, sink));
    }
}
