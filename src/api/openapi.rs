//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the media-dl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the media-dl REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "media-dl REST API",
        version = "0.1.0",
        description = "Start media downloads, follow their progress over server-sent events and fetch the finished files",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Downloads
        crate::api::routes::start_download,
        crate::api::routes::get_job,
        crate::api::routes::list_jobs,

        // Progress
        crate::api::routes::progress_stream,

        // System
        crate::api::routes::root_banner,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::MediaId,
        crate::types::JobStatus,
        crate::types::JobSnapshot,
        crate::types::ProgressUpdate,
        crate::types::DownloadResponse,

        // API request types from routes
        crate::api::routes::DownloadRequest,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "downloads", description = "Start downloads and inspect jobs"),
        (name = "progress", description = "Server-sent progress events for a single job"),
        (name = "system", description = "System endpoints - Banner, health check, OpenAPI spec"),
    )
)]
pub struct ApiDoc;
