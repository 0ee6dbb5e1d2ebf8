//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`downloads`] - Start downloads, inspect jobs
//! - [`progress`] - Server-sent progress events
//! - [`system`] - Banner, health, OpenAPI

use serde::{Deserialize, Serialize};

mod downloads;
mod progress;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use downloads::*;
pub use progress::*;
pub use system::*;

// ============================================================================
// Request Types (shared across handlers)
// ============================================================================

/// Request body for POST /download
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadRequest {
    /// Media page URL, e.g. `https://www.youtube.com/watch?v=dQw4w9WgXcQ`
    pub url: Option<String>,
}
