//! Publish phase: upload ledger in, site ledger out.
//!
//! Only records the store phase marked ok are attempted. Each worker
//! uploads the recorded thumbnail (media id 0 when none is available)
//! and creates a post embedding an iframe at the record's embed URL.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use vpress_models::{ledger, PublishRecord, UploadRecord};
use vpress_site::{embed_html, SiteClient, SiteError};

use crate::error::{PipelineError, PipelineResult};
use crate::pool::{fan_out, PhaseSummary};
use crate::retry::{retry_async, RetryConfig};

/// Attempts per remote call.
const MAX_ATTEMPTS: u32 = 3;

/// Randomized backoff window for site calls.
const SITE_BACKOFF: (Duration, Duration) = (Duration::from_secs(2), Duration::from_secs(10));

/// Options for the publish phase.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Store-phase ledger to read.
    pub ledger: PathBuf,
    /// Site-phase ledger to write.
    pub out_ledger: PathBuf,
    /// Worker pool size. Posting defaults to sequential (1); larger
    /// pools are opt-in.
    pub workers: usize,
    /// Post status: publish, draft or private.
    pub post_status: String,
    /// Iframe width in the post body.
    pub embed_width: u32,
    /// Iframe height in the post body.
    pub embed_height: u32,
}

/// Run the publish phase.
///
/// Fatal when the store ledger is missing or holds no ok records.
/// Error records from the store phase are never forwarded.
pub async fn run_publish(client: SiteClient, opts: PublishOptions) -> PipelineResult<PhaseSummary> {
    if !opts.ledger.exists() {
        return Err(PipelineError::MissingInput(opts.ledger));
    }

    let records: Vec<UploadRecord> = ledger::read_snapshot(&opts.ledger)?;
    let publishable: Vec<UploadRecord> = records.into_iter().filter(|r| r.is_ok()).collect();
    if publishable.is_empty() {
        return Err(PipelineError::NothingToPublish(opts.ledger));
    }

    info!(
        items = publishable.len(),
        workers = opts.workers,
        "Starting publish phase"
    );

    let client = Arc::new(client);
    let opts_arc = Arc::new(opts);

    let task_opts = Arc::clone(&opts_arc);
    let results = fan_out(opts_arc.workers, publishable, move |_, record| {
        let client = Arc::clone(&client);
        let opts = Arc::clone(&task_opts);
        async move { publish_record(&client, &opts, record).await }
    })
    .await;

    ledger::write_snapshot(&opts_arc.out_ledger, &results)?;

    let ok = results.iter().filter(|r| r.is_ok()).count();
    let summary = PhaseSummary {
        ok,
        failed: results.len() - ok,
    };
    info!(
        ok = summary.ok,
        failed = summary.failed,
        ledger = %opts_arc.out_ledger.display(),
        "Publish phase complete"
    );
    Ok(summary)
}

/// Publish one upload record; always returns a record.
async fn publish_record(
    client: &SiteClient,
    opts: &PublishOptions,
    record: UploadRecord,
) -> PublishRecord {
    let (title, embed_url, thumbnail) = match record {
        UploadRecord::Ok {
            title,
            embed_url,
            thumbnail,
            ..
        } => (title, embed_url, thumbnail),
        // Filtered out by the caller.
        UploadRecord::Error { title, .. } => {
            return PublishRecord::Error {
                title,
                error: "unpublishable record".to_string(),
            }
        }
    };

    match publish_steps(client, opts, &title, &embed_url, thumbnail.as_deref()).await {
        Ok(post_id) => {
            info!(title = %title, post_id, "Published");
            PublishRecord::Ok { title, post_id }
        }
        Err(e) => {
            error!(title = %title, "Publish failed: {}", e);
            PublishRecord::Error {
                title,
                error: e.to_string(),
            }
        }
    }
}

/// Media upload (optional) then post creation, each with retry.
async fn publish_steps(
    client: &SiteClient,
    opts: &PublishOptions,
    title: &str,
    embed_url: &str,
    thumbnail: Option<&std::path::Path>,
) -> Result<u64, SiteError> {
    let media_id = match thumbnail.filter(|p| p.exists()) {
        Some(thumb) => {
            let media_policy =
                RetryConfig::randomized("upload_media", MAX_ATTEMPTS, SITE_BACKOFF.0, SITE_BACKOFF.1);
            retry_async(
                &media_policy,
                || client.upload_media(thumb),
                SiteError::is_retryable,
                SiteError::retry_after_ms,
            )
            .await?
        }
        // No thumbnail recorded: post without a featured image.
        None => 0,
    };

    let content = embed_html(embed_url, opts.embed_width, opts.embed_height);
    let post_policy =
        RetryConfig::randomized("create_post", MAX_ATTEMPTS, SITE_BACKOFF.0, SITE_BACKOFF.1);
    retry_async(
        &post_policy,
        || client.create_post(title, &content, media_id, &opts.post_status),
        SiteError::is_retryable,
        SiteError::retry_after_ms,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpress_site::SiteConfig;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SiteClient {
        let mut config = SiteConfig::new(server.uri(), "admin", "pw").unwrap();
        config.timeout = Duration::from_secs(5);
        SiteClient::new(config).unwrap()
    }

    fn options(dir: &tempfile::TempDir) -> PublishOptions {
        PublishOptions {
            ledger: dir.path().join("store_results.json"),
            out_ledger: dir.path().join("site_results.json"),
            workers: 1,
            post_status: "publish".to_string(),
            embed_width: 640,
            embed_height: 360,
        }
    }

    fn write_store_ledger(dir: &tempfile::TempDir, records: &[UploadRecord]) {
        ledger::write_snapshot(&dir.path().join("store_results.json"), records).unwrap();
    }

    #[tokio::test]
    async fn missing_ledger_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start().await;
        let err = run_publish(client_for(&server), options(&dir))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput(_)));
    }

    #[tokio::test]
    async fn ledger_with_only_errors_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_store_ledger(
            &dir,
            &[UploadRecord::Error {
                title: "A".to_string(),
                error: "boom".to_string(),
            }],
        );
        let server = MockServer::start().await;
        let err = run_publish(client_for(&server), options(&dir))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NothingToPublish(_)));
    }

    #[tokio::test]
    async fn publishes_only_ok_records() {
        let dir = tempfile::tempdir().unwrap();
        let thumb = dir.path().join("001_Foo.jpg");
        std::fs::write(&thumb, b"jpeg").unwrap();
        write_store_ledger(
            &dir,
            &[
                UploadRecord::Ok {
                    title: "Foo".to_string(),
                    video_id: "v1".to_string(),
                    embed_url: "https://iframe.mediadelivery.net/embed/7/v1".to_string(),
                    thumbnail: Some(thumb),
                },
                UploadRecord::Error {
                    title: "Bad".to_string(),
                    error: "boom".to_string(),
                },
                UploadRecord::Ok {
                    title: "Bar".to_string(),
                    video_id: "v2".to_string(),
                    embed_url: "https://iframe.mediadelivery.net/embed/7/v2".to_string(),
                    thumbnail: None,
                },
            ],
        );

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/wp-json/wp/v2/media"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": 11 })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/wp-json/wp/v2/posts"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": 55 })),
            )
            .expect(2)
            .mount(&server)
            .await;

        let opts = options(&dir);
        let summary = run_publish(client_for(&server), opts.clone()).await.unwrap();
        assert_eq!(summary, PhaseSummary { ok: 2, failed: 0 });

        let results: Vec<PublishRecord> = ledger::read_snapshot(&opts.out_ledger).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title(), "Foo");
        assert_eq!(results[1].title(), "Bar");
    }

    #[tokio::test]
    async fn record_without_thumbnail_posts_featured_media_zero() {
        let dir = tempfile::tempdir().unwrap();
        write_store_ledger(
            &dir,
            &[UploadRecord::Ok {
                title: "Foo".to_string(),
                video_id: "v1".to_string(),
                embed_url: "https://iframe.mediadelivery.net/embed/7/v1".to_string(),
                thumbnail: None,
            }],
        );

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/wp-json/wp/v2/posts"))
            .and(body_partial_json(serde_json::json!({ "featured_media": 0 })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": 56 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let summary = run_publish(client_for(&server), options(&dir)).await.unwrap();
        assert_eq!(summary, PhaseSummary { ok: 1, failed: 0 });
    }

    #[tokio::test]
    async fn post_failure_yields_error_record() {
        let dir = tempfile::tempdir().unwrap();
        write_store_ledger(
            &dir,
            &[UploadRecord::Ok {
                title: "Foo".to_string(),
                video_id: "v1".to_string(),
                embed_url: "https://iframe.mediadelivery.net/embed/7/v1".to_string(),
                thumbnail: None,
            }],
        );

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/wp-json/wp/v2/posts"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let opts = options(&dir);
        let summary = run_publish(client_for(&server), opts.clone()).await.unwrap();
        assert_eq!(summary, PhaseSummary { ok: 0, failed: 1 });

        let results: Vec<PublishRecord> = ledger::read_snapshot(&opts.out_ledger).unwrap();
        match &results[0] {
            PublishRecord::Error { error, .. } => assert!(error.contains("create_post [403]")),
            other => panic!("expected error record, got {:?}", other),
        }
    }
}
