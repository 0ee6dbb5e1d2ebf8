//! Shutdown coordination.

use crate::error::Result;

use super::MediaDownloader;

impl MediaDownloader {
    /// Gracefully shut down the downloader
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new download requests
    /// 2. Cancels all running pipelines (each deletes its partial file and
    ///    marks its job `failed`)
    /// 3. Waits for the pipelines to finish, bounded by `shutdown_grace`
    ///
    /// Progress subscriptions end on their own once their jobs turn terminal.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new downloads
        self.active
            .accepting_new
            .store(false, std::sync::atomic::Ordering::SeqCst);
        tracing::info!("Stopped accepting new downloads");

        // 2. Cancel running pipelines
        self.cancel_all().await;

        // 3. Wait for pipelines to unwind with timeout
        let grace = self.config.download.shutdown_grace;
        match tokio::time::timeout(grace, self.wait_for_active_downloads()).await {
            Ok(()) => {
                tracing::info!("All active downloads stopped");
            }
            Err(_) => {
                tracing::warn!(
                    grace_secs = grace.as_secs_f64(),
                    "Timeout waiting for downloads to stop, proceeding with shutdown"
                );
            }
        }

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Signal cancellation to every running pipeline
    pub(crate) async fn cancel_all(&self) {
        let active = self.active.tokens.lock().await;
        tracing::debug!(active_count = active.len(), "Cancelling all active downloads");

        for token in active.values() {
            token.cancel();
        }
    }

    /// Wait until no pipeline is registered as active
    async fn wait_for_active_downloads(&self) {
        loop {
            let active_count = {
                let active = self.active.tokens.lock().await;
                active.len()
            };

            if active_count == 0 {
                return;
            }

            tracing::debug!(active_count, "Waiting for active downloads to stop");
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    }
}
