//! Configuration types for media-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Download behavior configuration (artifact root, progress cadence, stall policy)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Artifact root directory (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Container extension of stored artifacts (default: "mp4")
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Cadence of progress snapshots pushed to subscribers (default: 1 second)
    #[serde(default = "default_progress_interval", with = "duration_serde")]
    pub progress_interval: Duration,

    /// Fail a download when no chunk arrives for this long (default: 60 seconds)
    ///
    /// `None` lets a stalled upstream keep the job in `downloading` forever.
    #[serde(default = "default_idle_timeout", with = "optional_duration_serde")]
    pub idle_timeout: Option<Duration>,

    /// How long shutdown waits for in-flight downloads to clean up (default: 10 seconds)
    #[serde(default = "default_shutdown_grace", with = "duration_serde")]
    pub shutdown_grace: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            file_extension: default_file_extension(),
            progress_interval: default_progress_interval(),
            idle_timeout: default_idle_timeout(),
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

/// External media provider settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the extraction endpoint (default: "http://127.0.0.1:8080")
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,

    /// User-Agent sent with every provider request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for metadata requests (default: 30 seconds)
    ///
    /// Media streams are governed by [`DownloadConfig::idle_timeout`] instead.
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            user_agent: default_user_agent(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Main configuration for MediaDownloader
///
/// Fields are organized into sub-configs:
/// - [`download`](DownloadConfig) - artifact storage and job behavior
/// - [`provider`](ProviderConfig) - the external media provider
/// - [`server`](ServerIntegrationConfig) - REST API
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Media provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// API server settings
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Artifact root directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.download.download_dir
    }

    /// Reject settings the downloader cannot run with
    pub fn validate(&self) -> Result<()> {
        let ext = self.download.file_extension.trim_start_matches('.');
        if ext.is_empty() || ext.contains(['/', '\\']) {
            return Err(Error::Config {
                message: "file extension must be a non-empty single path component".into(),
                key: Some("file_extension".into()),
            });
        }

        if self.download.progress_interval.is_zero() {
            return Err(Error::Config {
                message: "progress interval must be greater than zero".into(),
                key: Some("progress_interval".into()),
            });
        }

        if self.download.idle_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::Config {
                message: "idle timeout must be greater than zero (omit it to disable)".into(),
                key: Some("idle_timeout".into()),
            });
        }

        Ok(())
    }
}

/// API and external server integration settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:3000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_file_extension() -> String {
    "mp4".to_string()
}

fn default_progress_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_idle_timeout() -> Option<Duration> {
    Some(Duration::from_secs(60))
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(10)
}

fn default_provider_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
