//! Metadata resolution and canonical artifact naming
//!
//! The artifact path of a job is derived from the provider's title and id, so
//! resolution always happens before the existence check and before any job
//! is registered.

use crate::artifact_store::PARTIAL_SUFFIX;
use crate::error::{Error, Result};
use crate::provider::MediaProvider;
use crate::types::{MediaId, Metadata};
use std::sync::Arc;

/// Characters rejected by common filesystems
const ILLEGAL_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Substitute for titles that sanitize to nothing
pub const FALLBACK_TITLE: &str = "video";

/// Longest file name (in bytes) accepted by common filesystems
pub const MAX_FILE_NAME_BYTES: usize = 255;

/// Strip characters that are illegal in file names and trim whitespace
///
/// Idempotent: sanitizing a sanitized title returns it unchanged.
pub fn sanitize_title(title: &str) -> String {
    let stripped: String = title
        .chars()
        .filter(|c| !ILLEGAL_FILENAME_CHARS.contains(c) && !c.is_control())
        .collect();
    let trimmed = stripped.trim();

    if trimmed.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// `"{sanitized title} [{id}].{ext}"`
///
/// The title is shortened (on a character boundary) so that the name plus the
/// partial-write suffix stays within [`MAX_FILE_NAME_BYTES`].
pub fn canonical_file_name(title: &str, id: &MediaId, extension: &str) -> String {
    let suffix = format!(" [{}].{}", id, extension.trim_start_matches('.'));
    let budget = MAX_FILE_NAME_BYTES.saturating_sub(suffix.len() + PARTIAL_SUFFIX.len());

    let sanitized = sanitize_title(title);
    let mut shortened = truncate_to_bytes(&sanitized, budget).trim_end();
    if shortened.len() < sanitized.len() {
        tracing::debug!(
            media_id = %id,
            title_bytes = sanitized.len(),
            kept_bytes = shortened.len(),
            "Shortened long title for the artifact name"
        );
    }
    if shortened.is_empty() {
        shortened = FALLBACK_TITLE;
    }

    format!("{shortened}{suffix}")
}

fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Metadata together with the artifact name derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    /// Provider metadata
    pub metadata: Metadata,
    /// Canonical artifact file name (no directory)
    pub file_name: String,
}

/// Wraps the provider's metadata capability
#[derive(Clone)]
pub struct MetadataResolver {
    provider: Arc<dyn MediaProvider>,
    extension: String,
}

impl MetadataResolver {
    /// Create a resolver that names artifacts with `extension`
    pub fn new(provider: Arc<dyn MediaProvider>, extension: impl Into<String>) -> Self {
        Self {
            provider,
            extension: extension.into(),
        }
    }

    /// Resolve metadata for `url` and derive the canonical artifact name
    ///
    /// Every failure is reported as [`Error::UpstreamUnavailable`]; the raw
    /// diagnostic is logged here and nowhere else.
    pub async fn resolve(&self, url: &str) -> Result<ResolvedMedia> {
        let raw = match self.provider.resolve_metadata(url).await {
            Ok(raw) => raw,
            Err(e) => {
                let detail = match e {
                    Error::UpstreamUnavailable { detail } => detail,
                    other => other.to_string(),
                };
                tracing::warn!(
                    provider = self.provider.name(),
                    url,
                    detail = %detail,
                    "Metadata resolution failed"
                );
                return Err(Error::UpstreamUnavailable { detail });
            }
        };

        let id = raw.id.trim();
        if id.is_empty() || id.contains(ILLEGAL_FILENAME_CHARS) {
            tracing::warn!(provider = self.provider.name(), url, id = %raw.id, "Provider returned an unusable media id");
            return Err(Error::upstream(format!("unusable media id '{}'", raw.id)));
        }

        let metadata = Metadata {
            id: MediaId::new(id),
            title: raw.title,
            author: raw.author,
            // highest resolution comes last
            thumbnail_url: raw.thumbnails.last().cloned().unwrap_or_default(),
        };
        let file_name = canonical_file_name(&metadata.title, &metadata.id, &self.extension);

        tracing::debug!(media_id = %metadata.id, file_name, "Metadata resolved");
        Ok(ResolvedMedia {
            metadata,
            file_name,
        })
    }
}
