//! Traits and types for the external media provider

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Raw metadata as returned by a provider, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMetadata {
    /// Provider identifier of the media item
    pub id: String,
    /// Title as published
    pub title: String,
    /// Channel or uploader name
    pub author: String,
    /// Thumbnail URLs ordered from lowest to highest resolution
    pub thumbnails: Vec<String>,
}

/// An opened media byte stream
pub struct MediaStream {
    /// Total byte length advertised by the provider, if any
    pub content_length: Option<u64>,
    /// Chunks in order; an `Err` item aborts the download
    pub chunks: BoxStream<'static, std::io::Result<Bytes>>,
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Black-box media extraction capability
///
/// Implementations map every failure (network, blocking, malformed answers)
/// to [`crate::Error::UpstreamUnavailable`]; the detail is logged by callers
/// and never shown to clients.
///
/// # Examples
///
/// ```no_run
/// use media_dl::provider::{HttpProvider, MediaProvider};
/// use media_dl::config::ProviderConfig;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = HttpProvider::new(&ProviderConfig::default())?;
/// let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
///
/// let meta = provider.resolve_metadata(url).await?;
/// let stream = provider.open_stream(url).await?;
/// println!("{} ({:?} bytes)", meta.title, stream.content_length);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Fetch id, title, author and thumbnails for a media URL
    async fn resolve_metadata(&self, url: &str) -> crate::Result<ProviderMetadata>;

    /// Open the media byte stream for a URL
    async fn open_stream(&self, url: &str) -> crate::Result<MediaStream>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
