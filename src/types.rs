//! Core types for media-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Stable external identifier of a media item (the provider's video id)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct MediaId(pub String);

impl MediaId {
    /// Create a new MediaId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MediaId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MediaId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a download job
///
/// Transitions only move forward: `Downloading -> Completed` or
/// `Downloading -> Failed`. Both terminal states are final.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Bytes are being streamed into the artifact store
    Downloading,
    /// The artifact is fully written
    Completed,
    /// The download failed and its partial artifact was removed
    Failed,
}

impl JobStatus {
    /// Whether no further transition is permitted
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Downloading => "downloading",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable read of a job's fields at one instant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    /// Media identifier (registry key)
    pub id: MediaId,
    /// Current lifecycle state
    pub status: JobStatus,
    /// Expected byte length, 0 while unknown
    pub total_size: u64,
    /// Bytes written so far
    pub downloaded: u64,
    /// Derived completion percentage (0-100)
    pub progress: f64,
    /// Public retrieval path of the artifact, fixed at creation
    pub file_path: String,
    /// When the job was registered
    pub created_at: DateTime<Utc>,
    /// When the job reached a terminal state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobSnapshot {
    /// Snapshot of a freshly registered job
    pub fn new(id: MediaId, file_path: impl Into<String>) -> Self {
        Self {
            id,
            status: JobStatus::Downloading,
            total_size: 0,
            downloaded: 0,
            progress: 0.0,
            file_path: file_path.into(),
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Whether the job has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Recompute `progress` from `downloaded` and `total_size`
    pub(crate) fn refresh_progress(&mut self) {
        self.progress = progress_percent(self.downloaded, self.total_size);
    }

    /// The unit pushed to progress subscribers
    pub fn to_update(&self) -> ProgressUpdate {
        ProgressUpdate {
            progress: self.progress,
            total_size: self.total_size,
            downloaded: self.downloaded,
            status: self.status,
        }
    }
}

/// `downloaded / total * 100`, or 0 when the total is unknown
pub fn progress_percent(downloaded: u64, total_size: u64) -> f64 {
    if total_size == 0 {
        return 0.0;
    }
    ((downloaded as f64 / total_size as f64) * 100.0).min(100.0)
}

/// One unit of the progress push channel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    /// Completion percentage (0-100)
    pub progress: f64,
    /// Expected byte length, 0 while unknown
    pub total_size: u64,
    /// Bytes written so far
    pub downloaded: u64,
    /// Current lifecycle state
    pub status: JobStatus,
}

/// Media metadata as reported by the provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Provider identifier of the media item
    pub id: MediaId,
    /// Original (unsanitized) title
    pub title: String,
    /// Channel or uploader name
    pub author: String,
    /// Thumbnail image URL
    pub thumbnail_url: String,
}

/// Response body of a download request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    /// Always true for successful requests
    pub success: bool,
    /// Media identifier, also the key of the progress subscription
    pub id: MediaId,
    /// Original title
    pub title: String,
    /// Channel or uploader name
    pub author: String,
    /// Thumbnail image URL
    pub thumbnail_url: String,
    /// `completed` when the artifact already existed, otherwise the job status
    pub status: JobStatus,
    /// Public retrieval path of the artifact
    pub file_path: String,
}

impl DownloadResponse {
    pub(crate) fn new(metadata: Metadata, status: JobStatus, file_path: String) -> Self {
        Self {
            success: true,
            id: metadata.id,
            title: metadata.title,
            author: metadata.author,
            thumbnail_url: metadata.thumbnail_url,
            status,
            file_path,
        }
    }
}
