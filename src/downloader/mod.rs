//! Core downloader implementation split into focused submodules.
//!
//! The `MediaDownloader` struct and its methods are organized by domain:
//! - [`request`] - Validate, resolve, deduplicate and start a download
//! - [`pipeline`] - Stream provider bytes into the artifact store
//! - [`lifecycle`] - Shutdown coordination

mod lifecycle;
mod pipeline;
mod request;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::artifact_store::ArtifactStore;
use crate::config::Config;
use crate::error::Result;
use crate::provider::{HttpProvider, MediaProvider};
use crate::publisher::ProgressPublisher;
use crate::registry::JobRegistry;
use crate::resolver::MetadataResolver;
use crate::types::{JobSnapshot, MediaId};
use futures::Stream;
use std::sync::Arc;

/// Running pipelines and the shutdown switch
#[derive(Clone)]
pub(crate) struct ActiveDownloads {
    /// Cancellation tokens of running pipelines, keyed by pipeline serial
    ///
    /// Keyed by serial rather than media id: a retried job may start a new
    /// pipeline while the failed one is still unwinding.
    pub(crate) tokens: Arc<
        tokio::sync::Mutex<std::collections::HashMap<u64, tokio_util::sync::CancellationToken>>,
    >,
    /// Source of pipeline serials
    pub(crate) next_serial: Arc<std::sync::atomic::AtomicU64>,
    /// Flag to indicate whether new downloads are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<std::sync::atomic::AtomicBool>,
}

impl ActiveDownloads {
    fn new() -> Self {
        Self {
            tokens: Arc::new(tokio::sync::Mutex::new(std::collections::HashMap::new())),
            next_serial: Arc::new(std::sync::atomic::AtomicU64::new(0)),
            accepting_new: Arc::new(std::sync::atomic::AtomicBool::new(true)),
        }
    }
}

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct MediaDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Media provider used for metadata and byte streams
    pub(crate) provider: Arc<dyn MediaProvider>,
    /// Metadata resolution and artifact naming
    pub(crate) resolver: MetadataResolver,
    /// Finished and in-progress artifacts on disk
    pub(crate) store: ArtifactStore,
    /// Live job state, shared with every progress subscription
    pub(crate) registry: Arc<JobRegistry>,
    /// Hands out per-job progress streams
    pub(crate) publisher: ProgressPublisher,
    /// Running pipelines
    pub(crate) active: ActiveDownloads,
}

impl MediaDownloader {
    /// Create a downloader backed by the HTTP provider described in `config`
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, when the provider client cannot be
    /// built, or when the download directory cannot be created.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let provider = HttpProvider::new(&config.provider)?;
        Self::with_provider(config, Arc::new(provider)).await
    }

    /// Create a downloader backed by any [`MediaProvider`]
    pub async fn with_provider(config: Config, provider: Arc<dyn MediaProvider>) -> Result<Self> {
        config.validate()?;

        let store = ArtifactStore::open(config.download.download_dir.clone()).await?;
        let registry = Arc::new(JobRegistry::new());
        let publisher = ProgressPublisher::new(registry.clone(), config.download.progress_interval);
        let resolver = MetadataResolver::new(provider.clone(), config.download.file_extension.clone());

        tracing::info!(
            provider = provider.name(),
            download_dir = %store.root().display(),
            "Media downloader initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            provider,
            resolver,
            store,
            registry,
            publisher,
            active: ActiveDownloads::new(),
        })
    }

    /// Stream of progress snapshots for `id`
    ///
    /// Waits silently until the job exists, emits once per progress interval
    /// while it downloads, emits the terminal snapshot immediately and ends.
    pub fn subscribe_progress<I: Into<MediaId>>(
        &self,
        id: I,
    ) -> impl Stream<Item = JobSnapshot> + Send + 'static + use<I> {
        self.publisher.subscribe(id.into())
    }

    /// Current snapshot of job `id`, if the process has seen it
    pub fn job(&self, id: &MediaId) -> Option<JobSnapshot> {
        self.registry.get(id)
    }

    /// Snapshots of all jobs seen by this process
    pub fn jobs(&self) -> Vec<JobSnapshot> {
        self.registry.list()
    }

    /// Number of pipelines currently running
    pub async fn active_download_count(&self) -> usize {
        self.active.tokens.lock().await.len()
    }

    /// Whether new download requests are accepted
    pub fn is_accepting(&self) -> bool {
        self.active
            .accepting_new
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Shared job registry
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Artifact store
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Active configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server runs concurrently with the download pipelines and listens on
    /// the configured bind address (default: 127.0.0.1:3000).
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let downloader = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }
}
