//! WordPress REST API client.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};
use url::Url;

use crate::error::{SiteError, SiteResult};

/// Default iframe width in the post body.
pub const DEFAULT_EMBED_WIDTH: u32 = 640;

/// Default iframe height in the post body.
pub const DEFAULT_EMBED_HEIGHT: u32 = 360;

/// Error bodies are truncated to this length in messages.
const ERROR_BODY_LIMIT: usize = 200;

/// Site client configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Base site URL, e.g. `https://example.com` (no trailing slash).
    pub base_url: String,
    /// WordPress username.
    pub username: String,
    /// Application password.
    pub app_password: String,
    /// Per-request deadline.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
}

impl SiteConfig {
    /// Build a config, validating the site URL.
    pub fn new(
        base_url: impl AsRef<str>,
        username: impl Into<String>,
        app_password: impl Into<String>,
    ) -> SiteResult<Self> {
        let base_url = base_url.as_ref();
        Url::parse(base_url)
            .map_err(|e| SiteError::config(format!("Invalid site URL '{}': {}", base_url, e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.into(),
            app_password: app_password.into(),
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        })
    }

    /// Create config from environment variables (`WP_SITE`, `WP_USER`,
    /// `WP_APP_PW`).
    pub fn from_env() -> SiteResult<Self> {
        let site = std::env::var("WP_SITE").map_err(|_| SiteError::config("WP_SITE must be set"))?;
        let user = std::env::var("WP_USER").map_err(|_| SiteError::config("WP_USER must be set"))?;
        let pw =
            std::env::var("WP_APP_PW").map_err(|_| SiteError::config("WP_APP_PW must be set"))?;
        Self::new(site, user, pw)
    }
}

/// WordPress REST API client.
#[derive(Clone)]
pub struct SiteClient {
    http: Client,
    config: SiteConfig,
}

impl SiteClient {
    /// Create a new site client.
    pub fn new(config: SiteConfig) -> SiteResult<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("vpress-site/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SiteError::Network)?;

        Ok(Self { http, config })
    }

    /// Upload a JPEG to the media endpoint; returns the media id.
    pub async fn upload_media(&self, image: &Path) -> SiteResult<u64> {
        let url = format!("{}/wp-json/wp/v2/media", self.config.base_url);
        let filename = image
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("thumbnail.jpg");

        let file = tokio::fs::File::open(image).await?;
        let len = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let response = self
            .http
            .post(&url)
            .timeout(self.config.timeout)
            .basic_auth(&self.config.username, Some(&self.config.app_password))
            .header(
                "Content-Disposition",
                format!("attachment; filename={}", filename),
            )
            .header("Content-Type", "image/jpeg")
            .header("Content-Length", len)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !matches!(status, StatusCode::OK | StatusCode::CREATED) {
            return Err(Self::error_from_response("upload_media", response).await);
        }

        let data: serde_json::Value = response.json().await?;
        let id = data
            .get("id")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| SiteError::invalid_response("upload_media: no id field"))?;

        debug!(media_id = id, filename = %filename, "Uploaded media");
        Ok(id)
    }

    /// Create a post; returns the post id.
    ///
    /// `featured_media` of 0 means no featured image.
    pub async fn create_post(
        &self,
        title: &str,
        content: &str,
        featured_media: u64,
        status: &str,
    ) -> SiteResult<u64> {
        let url = format!("{}/wp-json/wp/v2/posts", self.config.base_url);

        let response = self
            .http
            .post(&url)
            .timeout(self.config.timeout)
            .basic_auth(&self.config.username, Some(&self.config.app_password))
            .json(&serde_json::json!({
                "title": title,
                "content": content,
                "featured_media": featured_media,
                "status": status,
            }))
            .send()
            .await?;

        let resp_status = response.status();
        if !matches!(resp_status, StatusCode::OK | StatusCode::CREATED) {
            return Err(Self::error_from_response("create_post", response).await);
        }

        let data: serde_json::Value = response.json().await?;
        let id = data
            .get("id")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| SiteError::invalid_response("create_post: no id field"))?;

        info!(post_id = id, title = %title, "Created post");
        Ok(id)
    }

    async fn error_from_response(operation: &str, response: reqwest::Response) -> SiteError {
        let status = response.status();
        let retry_after_ms = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(|secs| secs * 1000);

        let body = response.text().await.unwrap_or_default();
        let truncated: String = body.chars().take(ERROR_BODY_LIMIT).collect();
        SiteError::from_http_status(
            status.as_u16(),
            format!("{} [{}]: {}", operation, status.as_u16(), truncated),
            retry_after_ms,
        )
    }
}

/// Build the iframe embed fragment placed in the post body.
pub fn embed_html(embed_url: &str, width: u32, height: u32) -> String {
    format!(
        "<figure class=\"wp-block-embed is-type-video is-provider-bunnystream\">\n  \
         <iframe src=\"{}\" loading=\"lazy\" allowfullscreen \
         width=\"{}\" height=\"{}\" frameborder=\"0\"></iframe>\n</figure>",
        embed_url, width, height
    )
}
