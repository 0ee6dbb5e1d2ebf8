//! REST API server example
//!
//! Runs media-dl with the REST API enabled.
//!
//! ```text
//! cargo run --example serve -- [config.json]
//! ```
//!
//! Environment:
//! - `PORT` - listen port (default 3000)
//! - `MEDIA_DL_PROVIDER_URL` - base URL of the extraction service
//! - `RUST_LOG` - log filter (default `media_dl=info,tower_http=info`)
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:3000/swagger-ui
//! - Start a download via POST http://localhost:3000/download
//! - Follow progress via GET http://localhost:3000/progress/<id>
//! - Fetch the file at the returned `filePath`

use std::sync::Arc;
use media_dl::{Config, MediaDownloader, run_with_shutdown};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("media_dl=info,tower_http=info")),
        )
        .init();

    let mut config = match std::env::args().nth(1) {
        Some(path) => serde_json::from_str::<Config>(&std::fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    if let Ok(port) = std::env::var("PORT") {
        config.server.api.bind_address.set_port(port.parse()?);
    }
    if let Ok(base_url) = std::env::var("MEDIA_DL_PROVIDER_URL") {
        config.provider.base_url = base_url;
    }

    let address = config.server.api.bind_address;
    let downloader = Arc::new(MediaDownloader::new(config).await?);
    let api_handle = downloader.spawn_api_server();

    println!("media-dl listening on http://{address}");
    println!("Swagger UI: http://{address}/swagger-ui");
    println!();
    println!("Example commands:");
    println!("  curl -X POST http://{address}/download \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"url\": \"https://www.youtube.com/watch?v=dQw4w9WgXcQ\"}}'");
    println!("  curl -N http://{address}/progress/dQw4w9WgXcQ");

    run_with_shutdown((*downloader).clone()).await?;
    api_handle.abort();
    Ok(())
}
