//! # media-dl
//!
//! Media download service: validate a media page URL, resolve its metadata,
//! stream the media into a local artifact store and publish progress to any
//! number of subscribers.
//!
//! ## Design
//!
//! - **One job per media id** - duplicate requests join the running job, and
//!   an artifact already on disk is reported `completed` without a download
//! - **Non-blocking requests** - a request answers as soon as the job is
//!   registered; the transfer runs in its own task
//! - **Push progress** - subscribers receive a snapshot per tick and the
//!   terminal snapshot immediately; a subscription never affects the download
//! - **No half files** - artifacts are written to `<name>.part` and only
//!   renamed into place once complete
//!
//! ## Quick Start
//!
//! ```no_run
//! use futures::StreamExt;
//! use media_dl::{Config, MediaDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = MediaDownloader::new(Config::default()).await?;
//!
//!     let response = downloader
//!         .request_download("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
//!         .await?;
//!     println!("{} -> {}", response.title, response.file_path);
//!
//!     let mut progress = Box::pin(downloader.subscribe_progress(response.id));
//!     while let Some(snapshot) = progress.next().await {
//!         println!("{:?} {:.1}%", snapshot.status, snapshot.progress);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

pub mod api;
pub mod artifact_store;
pub mod config;
pub mod downloader;
pub mod error;
pub mod provider;
pub mod publisher;
pub mod registry;
pub mod resolver;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use artifact_store::{ArtifactSink, ArtifactStore};
pub use config::{ApiConfig, Config, DownloadConfig, ProviderConfig};
pub use downloader::MediaDownloader;
pub use error::{ApiError, DownloadError, Error, ErrorDetail, Result, ToHttpStatus};
pub use provider::{HttpProvider, MediaProvider, MediaStream, ProviderMetadata};
pub use publisher::ProgressPublisher;
pub use registry::{JobRegistry, JobWriter, Registration};
pub use resolver::{MetadataResolver, ResolvedMedia};
pub use types::{DownloadResponse, JobSnapshot, JobStatus, MediaId, Metadata, ProgressUpdate};

/// Helper function to run the downloader with graceful signal handling.
///
/// Waits for a termination signal and then calls the downloader's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use media_dl::{MediaDownloader, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let downloader = MediaDownloader::new(config).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(downloader).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: MediaDownloader) -> Result<()> {
    wait_for_signal().await;
    downloader.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
