//! Store REST API client.
//!
//! Thin wrapper over the store's three endpoints with HTTP client
//! tuning (pooling, connect/request deadlines) and error mapping by
//! status. Retry policy is decided by the caller; this layer only
//! classifies what is retryable.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// Default API surface of the store.
const DEFAULT_BASE_URL: &str = "https://video.bunnycdn.com";

/// Default base for player embed URLs.
const DEFAULT_EMBED_BASE: &str = "https://iframe.mediadelivery.net/embed";

/// Error bodies are truncated to this length in messages.
const ERROR_BODY_LIMIT: usize = 200;

/// Store client configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Static API key sent as the AccessKey header.
    pub api_key: String,
    /// Target library id.
    pub library_id: u64,
    /// API base URL.
    pub base_url: String,
    /// Base for embed URLs handed to the publish phase.
    pub embed_base: String,
    /// Deadline for metadata calls (create).
    pub api_timeout: Duration,
    /// Deadline for binary uploads.
    pub upload_timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
}

impl StoreConfig {
    /// Build a config from credentials, defaulting everything else.
    pub fn new(api_key: impl Into<String>, library_id: u64) -> Self {
        Self {
            api_key: api_key.into(),
            library_id,
            base_url: DEFAULT_BASE_URL.to_string(),
            embed_base: DEFAULT_EMBED_BASE.to_string(),
            api_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(3600),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Create config from environment variables.
    ///
    /// Requires `BUNNY_API_KEY` and `BUNNY_LIBRARY_ID`; `BUNNY_API_BASE`
    /// and `BUNNY_EMBED_BASE` override the default endpoints.
    pub fn from_env() -> StoreResult<Self> {
        let api_key = std::env::var("BUNNY_API_KEY")
            .map_err(|_| StoreError::config("BUNNY_API_KEY must be set"))?;
        if api_key.is_empty() {
            return Err(StoreError::config("BUNNY_API_KEY cannot be empty"));
        }

        let library_id = std::env::var("BUNNY_LIBRARY_ID")
            .map_err(|_| StoreError::config("BUNNY_LIBRARY_ID must be set"))?
            .parse()
            .map_err(|_| StoreError::config("BUNNY_LIBRARY_ID must be an integer"))?;

        let mut config = Self::new(api_key, library_id);
        if let Ok(base) = std::env::var("BUNNY_API_BASE") {
            config.base_url = base;
        }
        if let Ok(base) = std::env::var("BUNNY_EMBED_BASE") {
            config.embed_base = base;
        }
        Ok(config)
    }
}

/// Store REST API client.
#[derive(Clone)]
pub struct StoreClient {
    http: Client,
    config: StoreConfig,
}

impl StoreClient {
    /// Create a new store client.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("vpress-store/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StoreError::Network)?;

        Ok(Self { http, config })
    }

    /// Create a video object; returns its remote id.
    ///
    /// The id field is named `guid` by the current API, `videoId` by
    /// older deployments; both are accepted.
    pub async fn create_video(&self, title: &str) -> StoreResult<String> {
        let url = format!(
            "{}/library/{}/videos",
            self.config.base_url, self.config.library_id
        );

        let response = self
            .http
            .post(&url)
            .timeout(self.config.api_timeout)
            .header("AccessKey", &self.config.api_key)
            .header("Accept", "application/json")
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await?;

        let status = response.status();
        if !matches!(status, StatusCode::OK | StatusCode::CREATED) {
            return Err(Self::error_from_response("create_video", response).await);
        }

        let data: serde_json::Value = response.json().await?;
        let id = data
            .get("guid")
            .or_else(|| data.get("videoId"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| StoreError::invalid_response("create_video: no guid/videoId field"))?;

        debug!(title = %title, video_id = %id, "Created store video object");
        Ok(id.to_string())
    }

    /// Upload the video binary for an already-created object.
    pub async fn upload_video(&self, video_id: &str, path: &Path) -> StoreResult<()> {
        let url = format!(
            "{}/library/{}/videos/{}",
            self.config.base_url, self.config.library_id, video_id
        );

        let (body, len) = file_body(path).await?;
        let response = self
            .http
            .put(&url)
            .timeout(self.config.upload_timeout)
            .header("AccessKey", &self.config.api_key)
            .header("Content-Type", "application/octet-stream")
            .header("Content-Length", len)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !matches!(status, StatusCode::OK | StatusCode::CREATED) {
            return Err(Self::error_from_response("upload_video", response).await);
        }

        info!(
            video_id = %video_id,
            size_mb = len as f64 / (1024.0 * 1024.0),
            "Uploaded video binary"
        );
        Ok(())
    }

    /// Attach a thumbnail to a video object.
    pub async fn set_thumbnail(&self, video_id: &str, path: &Path) -> StoreResult<()> {
        let url = format!(
            "{}/library/{}/videos/{}/thumbnail",
            self.config.base_url, self.config.library_id, video_id
        );

        let (body, len) = file_body(path).await?;
        let response = self
            .http
            .post(&url)
            .timeout(self.config.api_timeout)
            .header("AccessKey", &self.config.api_key)
            .header("Content-Type", "application/octet-stream")
            .header("Content-Length", len)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !matches!(
            status,
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT
        ) {
            return Err(Self::error_from_response("set_thumbnail", response).await);
        }

        debug!(video_id = %video_id, "Attached thumbnail");
        Ok(())
    }

    /// Player embed URL for a stored video.
    pub fn embed_url(&self, video_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.embed_base, self.config.library_id, video_id
        )
    }

    /// Turn a non-success response into a `StoreError`, truncating the
    /// body like the progress logs expect.
    async fn error_from_response(operation: &str, response: reqwest::Response) -> StoreError {
        let status = response.status();
        let retry_after_ms = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(|secs| secs * 1000);

        let body = response.text().await.unwrap_or_default();
        let truncated: String = body.chars().take(ERROR_BODY_LIMIT).collect();
        StoreError::from_http_status(
            status.as_u16(),
            format!("{} [{}]: {}", operation, status.as_u16(), truncated),
            retry_after_ms,
        )
    }
}

/// Stream a file as a request body without loading it into memory.
async fn file_body(path: &Path) -> StoreResult<(reqwest::Body, u64)> {
    let file = tokio::fs::File::open(path).await?;
    let len = file.metadata().await?.len();
    Ok((reqwest::Body::wrap_stream(ReaderStream::new(file)), len))
}
