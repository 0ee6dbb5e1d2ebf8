//! HTTP-backed media provider
//!
//! Talks to an extraction endpoint that does the provider-specific work:
//!
//! - `GET {base}/info?url=<media url>` answers
//!   `{ "id", "title", "author", "thumbnails": [{ "url" }], "streamUrl" }`
//! - `GET <streamUrl>` serves the media bytes, with `Content-Length` when known

use super::traits::{MediaProvider, MediaStream, ProviderMetadata};
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoResponse {
    id: String,
    title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    thumbnails: Vec<Thumbnail>,
    stream_url: String,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// Media provider backed by an HTTP extraction service
#[derive(Debug, Clone)]
pub struct HttpProvider {
    /// Client for metadata calls (bounded by the request timeout)
    client: reqwest::Client,
    /// Client for media streams (no total timeout, stalls are handled per chunk)
    stream_client: reqwest::Client,
    info_url: url::Url,
}

impl HttpProvider {
    /// Build a provider from configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let base = config.base_url.trim_end_matches('/');
        let info_url = url::Url::parse(&format!("{base}/info")).map_err(|e| Error::Config {
            message: format!("invalid provider base URL '{}': {}", config.base_url, e),
            key: Some("base_url".into()),
        })?;

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()?;
        let stream_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            stream_client,
            info_url,
        })
    }

    async fn fetch_info(&self, url: &str) -> Result<InfoResponse> {
        let response = self
            .client
            .get(self.info_url.clone())
            .query(&[("url", url)])
            .send()
            .await
            .map_err(|e| Error::upstream(format!("metadata request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(format!(
                "metadata request returned HTTP {status}"
            )));
        }

        let info: InfoResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(format!("malformed metadata response: {e}")))?;

        if info.id.trim().is_empty() {
            return Err(Error::upstream("metadata response has an empty id"));
        }

        Ok(info)
    }
}

#[async_trait]
impl MediaProvider for HttpProvider {
    async fn resolve_metadata(&self, url: &str) -> Result<ProviderMetadata> {
        let info = self.fetch_info(url).await?;
        Ok(ProviderMetadata {
            id: info.id,
            title: info.title,
            author: info.author,
            thumbnails: info.thumbnails.into_iter().map(|t| t.url).collect(),
        })
    }

    async fn open_stream(&self, url: &str) -> Result<MediaStream> {
        let info = self.fetch_info(url).await?;

        let response = self
            .stream_client
            .get(&info.stream_url)
            .send()
            .await
            .map_err(|e| Error::upstream(format!("stream request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(format!(
                "stream request returned HTTP {status}"
            )));
        }

        let content_length = response.content_length();
        tracing::debug!(
            media_id = %info.id,
            content_length = ?content_length,
            "Media stream opened"
        );

        let chunks = response
            .bytes_stream()
            .map_err(std::io::Error::other)
            .boxed();

        Ok(MediaStream {
            content_length,
            chunks,
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
