//! Shared test helpers for creating MediaDownloader instances in tests.

use crate::config::Config;
use crate::downloader::MediaDownloader;
use crate::error::{Error, Result};
use crate::provider::{MediaProvider, MediaStream, ProviderMetadata};
use crate::types::{JobSnapshot, MediaId};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Media id used throughout the downloader tests
pub(crate) const SAMPLE_ID: &str = "dQw4w9WgXcQ";

/// A URL that passes validation and resolves to [`SAMPLE_ID`]
pub(crate) const SAMPLE_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Canonical artifact name for [`sample_metadata`]
pub(crate) const SAMPLE_FILE_NAME: &str = "Never Gonna Give You Up [dQw4w9WgXcQ].mp4";

/// Sender side of a scripted media stream
pub(crate) type ChunkSender = mpsc::UnboundedSender<std::io::Result<Bytes>>;

pub(crate) fn sample_id() -> MediaId {
    MediaId::from(SAMPLE_ID)
}

pub(crate) fn sample_metadata() -> ProviderMetadata {
    ProviderMetadata {
        id: SAMPLE_ID.to_string(),
        title: "Never Gonna Give You Up".to_string(),
        author: "Rick Astley".to_string(),
        thumbnails: vec![
            "https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg".to_string(),
            "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg".to_string(),
        ],
    }
}

/// Provider whose metadata and byte stream are controlled by the test
///
/// Each `open_stream` call takes the next scripted stream; the test feeds
/// chunks through the matching [`ChunkSender`] and ends the stream by dropping
/// it. Calls are counted so tests can assert how often the provider was hit.
pub(crate) struct ScriptedProvider {
    metadata: std::result::Result<ProviderMetadata, String>,
    content_length: Option<u64>,
    streams: Mutex<Vec<mpsc::UnboundedReceiver<std::io::Result<Bytes>>>>,
    open_error: Option<String>,
    resolve_delay: Duration,
    open_delay: Duration,
    pub(crate) resolve_calls: AtomicUsize,
    pub(crate) open_calls: AtomicUsize,
}

impl ScriptedProvider {
    /// Provider with one live stream fed through the returned sender
    pub(crate) fn gated(content_length: Option<u64>) -> (Self, ChunkSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::build(Ok(sample_metadata()), content_length, vec![rx]), tx)
    }

    /// Provider with one stream that yields `chunks` and ends
    pub(crate) fn with_chunks(content_length: Option<u64>, chunks: Vec<std::io::Result<Bytes>>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        for chunk in chunks {
            tx.send(chunk).unwrap();
        }
        Self::build(Ok(sample_metadata()), content_length, vec![rx])
    }

    /// Provider whose metadata lookup always fails
    pub(crate) fn unavailable(detail: &str) -> Self {
        Self::build(Err(detail.to_string()), None, vec![])
    }

    /// Provider that resolves metadata but refuses to open the stream
    pub(crate) fn refusing_stream(detail: &str) -> Self {
        let mut provider = Self::build(Ok(sample_metadata()), None, vec![]);
        provider.open_error = Some(detail.to_string());
        provider
    }

    /// Queue another stream for a later `open_stream` call
    pub(crate) fn push_stream(&self) -> ChunkSender {
        let (tx, rx) = mpsc::unbounded_channel();
        self.streams.lock().unwrap().insert(0, rx);
        tx
    }

    /// Delay every metadata lookup (widens race windows)
    pub(crate) fn with_resolve_delay(mut self, delay: Duration) -> Self {
        self.resolve_delay = delay;
        self
    }

    /// Delay every `open_stream` call (an upstream that never answers)
    pub(crate) fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    fn build(
        metadata: std::result::Result<ProviderMetadata, String>,
        content_length: Option<u64>,
        streams: Vec<mpsc::UnboundedReceiver<std::io::Result<Bytes>>>,
    ) -> Self {
        Self {
            metadata,
            content_length,
            streams: Mutex::new(streams),
            open_error: None,
            resolve_delay: Duration::ZERO,
            open_delay: Duration::ZERO,
            resolve_calls: AtomicUsize::new(0),
            open_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MediaProvider for ScriptedProvider {
    async fn resolve_metadata(&self, _url: &str) -> Result<ProviderMetadata> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if !self.resolve_delay.is_zero() {
            tokio::time::sleep(self.resolve_delay).await;
        }
        self.metadata.clone().map_err(Error::upstream)
    }

    async fn open_stream(&self, _url: &str) -> Result<MediaStream> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }
        if let Some(detail) = &self.open_error {
            return Err(Error::upstream(detail.clone()));
        }

        let rx = self
            .streams
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| Error::upstream("no scripted stream left"))?;

        Ok(MediaStream {
            content_length: self.content_length,
            chunks: UnboundedReceiverStream::new(rx).boxed(),
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Test configuration rooted in a fresh temporary directory
pub(crate) fn test_config(temp_dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("downloads");
    config.download.progress_interval = Duration::from_millis(20);
    config.download.idle_timeout = Some(Duration::from_secs(5));
    config.download.shutdown_grace = Duration::from_secs(5);
    config
}

/// Helper to create a test MediaDownloader backed by `provider`.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) async fn create_test_downloader(
    provider: Arc<ScriptedProvider>,
) -> (MediaDownloader, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let config = test_config(&temp_dir);
    let downloader = MediaDownloader::with_provider(config, provider)
        .await
        .unwrap();
    (downloader, temp_dir)
}

/// Collect every snapshot a fresh subscription emits for `id`
pub(crate) async fn collect_progress(downloader: &MediaDownloader, id: MediaId) -> Vec<JobSnapshot> {
    tokio::time::timeout(
        Duration::from_secs(10),
        downloader.subscribe_progress(id).collect::<Vec<_>>(),
    )
    .await
    .expect("progress stream did not finish")
}

/// Wait until the job for `id` reaches a terminal state and return it
pub(crate) async fn wait_for_terminal(downloader: &MediaDownloader, id: MediaId) -> JobSnapshot {
    collect_progress(downloader, id)
        .await
        .pop()
        .expect("progress stream ended without a snapshot")
}

/// Wait until every pipeline has unregistered itself
pub(crate) async fn wait_until_idle(downloader: &MediaDownloader) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while downloader.active_download_count().await > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("pipelines did not finish");
}
