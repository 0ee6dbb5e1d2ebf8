//! On-disk artifact storage
//!
//! Artifacts live flat under a single root directory. Writes go through an
//! [`ArtifactSink`], which streams into `<name>.part` and only renames to the
//! canonical name on [`ArtifactSink::commit`]. A file at the canonical path is
//! therefore always a finished artifact, and an interrupted write never leaves
//! anything that the existence check would mistake for one.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Suffix of in-progress writes
pub const PARTIAL_SUFFIX: &str = ".part";

/// URL prefix under which artifacts are served
pub const PUBLIC_PREFIX: &str = "/downloads";

/// Maps canonical file names to paths under the artifact root
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open the store, creating the root and sweeping stale partial files
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create download directory '{}': {}",
                    root.display(),
                    e
                ),
            ))
        })?;

        let store = Self { root };
        let swept = store.sweep_partials().await?;
        if swept > 0 {
            tracing::info!(swept, root = %store.root.display(), "Removed stale partial artifacts");
        }
        Ok(store)
    }

    /// Artifact root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of an artifact
    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Public retrieval path, e.g. `/downloads/My%20Video%20%5Bid%5D.mp4`
    pub fn public_path(&self, file_name: &str) -> String {
        format!("{}/{}", PUBLIC_PREFIX, urlencoding::encode(file_name))
    }

    /// Whether a finished artifact exists under `file_name`
    ///
    /// Pure presence check; contents are not inspected.
    pub async fn exists(&self, file_name: &str) -> bool {
        tokio::fs::metadata(self.path_of(file_name))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Open a write target for `file_name`
    ///
    /// Truncates any leftover partial file of the same name.
    pub async fn create_sink(&self, file_name: &str) -> Result<ArtifactSink> {
        let final_path = self.path_of(file_name);
        let part_path = self.path_of(&format!("{file_name}{PARTIAL_SUFFIX}"));
        let file = File::create(&part_path).await?;

        tracing::debug!(path = %part_path.display(), "Artifact sink opened");
        Ok(ArtifactSink {
            file: Some(BufWriter::new(file)),
            part_path,
            final_path,
            written: 0,
            finished: false,
        })
    }

    /// Delete a finished artifact; a missing file is not an error
    ///
    /// Partial files never go through here: their [`ArtifactSink`] removes
    /// them on [`abort`](ArtifactSink::abort), on a failed commit, or on drop.
    pub async fn delete(&self, file_name: &str) -> Result<()> {
        remove_if_present(&self.path_of(file_name)).await
    }

    async fn sweep_partials(&self) -> Result<usize> {
        let mut swept = 0;
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let is_partial = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(PARTIAL_SUFFIX));
            if is_partial && entry.file_type().await?.is_file() {
                remove_if_present(&entry.path()).await?;
                swept += 1;
            }
        }
        Ok(swept)
    }
}

async fn remove_if_present(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Scoped write target for one artifact
///
/// Either [`commit`](Self::commit) publishes the artifact or the partial file
/// is removed: explicitly by [`abort`](Self::abort), by a failed commit, or
/// when the sink is dropped unfinished.
#[derive(Debug)]
pub struct ArtifactSink {
    file: Option<BufWriter<File>>,
    part_path: PathBuf,
    final_path: PathBuf,
    written: u64,
    finished: bool,
}

impl ArtifactSink {
    /// Append a chunk
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| Error::Io(std::io::Error::other("artifact sink already closed")))?;
        file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Bytes written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush, sync and move the artifact to its canonical path
    pub async fn commit(mut self) -> Result<u64> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.get_ref().sync_all().await?;
        }
        tokio::fs::rename(&self.part_path, &self.final_path).await?;
        self.finished = true;

        tracing::debug!(path = %self.final_path.display(), bytes = self.written, "Artifact committed");
        Ok(self.written)
    }

    /// Close the sink and delete the partial file
    pub async fn abort(mut self) -> Result<()> {
        drop(self.file.take());
        let result = remove_if_present(&self.part_path).await;
        self.finished = result.is_ok();
        result
    }
}

impl Drop for ArtifactSink {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        drop(self.file.take());
        match std::fs::remove_file(&self.part_path) {
            Ok(()) => {
                tracing::debug!(path = %self.part_path.display(), "Removed unfinished partial artifact");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.part_path.display(), error = %e, "Failed to remove partial artifact");
            }
        }
    }
}
