//! Mock extraction service and downloader wiring for end-to-end tests

use futures::StreamExt;
use media_dl::{Config, JobSnapshot, MediaDownloader, MediaId};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Media id served by the mock extraction service
pub const MEDIA_ID: &str = "dQw4w9WgXcQ";

/// Page URL the mock service knows about
pub const MEDIA_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Title served by the mock (contains characters that must be sanitized)
pub const MEDIA_TITLE: &str = "Never Gonna: Give You Up?";

/// Artifact name the title above sanitizes to
pub const MEDIA_FILE_NAME: &str = "Never Gonna Give You Up [dQw4w9WgXcQ].mp4";

/// Deterministic media payload
pub fn media_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Start a mock extraction service serving `body` as the media stream
pub async fn start_provider(body: Vec<u8>) -> MockServer {
    start_provider_with_stream_delay(body, Duration::ZERO).await
}

/// Like [`start_provider`], but the stream response is held back by `delay`
pub async fn start_provider_with_stream_delay(body: Vec<u8>, delay: Duration) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/info"))
        .and(query_param("url", MEDIA_URL))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": MEDIA_ID,
            "title": MEDIA_TITLE,
            "author": "Rick Astley",
            "thumbnails": [
                { "url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg" },
                { "url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg" }
            ],
            "streamUrl": format!("{}/stream/{}", server.uri(), MEDIA_ID),
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/stream/{MEDIA_ID}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body)
                .set_delay(delay),
        )
        .mount(&server)
        .await;

    server
}

/// Start a mock extraction service that refuses every request
pub async fn start_refusing_provider() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
        .mount(&server)
        .await;
    server
}

/// Create a downloader talking to `provider`, rooted in a fresh temp dir
pub async fn create_downloader(provider: &MockServer) -> (Arc<MediaDownloader>, TempDir) {
    create_downloader_with(provider, |_| {}).await
}

/// Like [`create_downloader`], with a chance to adjust the configuration
pub async fn create_downloader_with(
    provider: &MockServer,
    customize: impl FnOnce(&mut Config),
) -> (Arc<MediaDownloader>, TempDir) {
    let temp_dir = tempfile::tempdir().expect("temp dir");

    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("downloads");
    config.download.progress_interval = Duration::from_millis(20);
    config.provider.base_url = provider.uri();
    config.server.api.bind_address = "127.0.0.1:0".parse().expect("socket address");
    customize(&mut config);

    let downloader = MediaDownloader::new(config)
        .await
        .expect("downloader should initialize");
    (Arc::new(downloader), temp_dir)
}

/// Collect a whole progress subscription (bounded by a timeout)
pub async fn collect_progress(downloader: &MediaDownloader, id: &str) -> Vec<JobSnapshot> {
    tokio::time::timeout(
        Duration::from_secs(10),
        downloader
            .subscribe_progress(MediaId::from(id))
            .collect::<Vec<_>>(),
    )
    .await
    .expect("progress stream should end")
}
