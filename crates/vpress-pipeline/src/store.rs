//! Store phase: media pairs in, upload ledger out.
//!
//! One worker per media pair runs the create → upload-binary →
//! set-thumbnail sequence, each call under its own retry policy.
//! Every attempted pair yields exactly one record; the ledger is
//! written even when items failed. An item that fails at step 2 may
//! leave an orphaned created-but-empty remote object; that is recorded,
//! not rolled back.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use vpress_models::{display_title, ledger, pair, MediaPair, UploadRecord};
use vpress_store::{StoreClient, StoreError};

use crate::error::{PipelineError, PipelineResult};
use crate::pool::{fan_out, PhaseSummary};
use crate::retry::{retry_async, RetryConfig};

/// Attempts per remote call.
const MAX_ATTEMPTS: u32 = 3;

/// Randomized backoff window for metadata calls.
const CREATE_BACKOFF: (Duration, Duration) = (Duration::from_secs(2), Duration::from_secs(10));

/// Fixed backoff for binary uploads.
const UPLOAD_BACKOFF: Duration = Duration::from_secs(5);

/// Options for the store phase.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Directory holding the fetch phase output.
    pub dir: PathBuf,
    /// Ledger file to write.
    pub out_ledger: PathBuf,
    /// Worker pool size.
    pub workers: usize,
}

/// Run the store phase.
///
/// Fatal when no media pairs are found. Returns the per-item summary;
/// the caller decides how a non-clean summary maps to an exit code.
pub async fn run_store(client: StoreClient, opts: StoreOptions) -> PipelineResult<PhaseSummary> {
    let pairs = pair::load_pairs(&opts.dir).map_err(|_| PipelineError::NoMedia(opts.dir.clone()))?;
    if pairs.is_empty() {
        return Err(PipelineError::NoMedia(opts.dir));
    }

    info!(
        items = pairs.len(),
        workers = opts.workers,
        "Starting store phase"
    );

    let client = Arc::new(client);
    let records = fan_out(opts.workers, pairs, move |_, pair| {
        let client = Arc::clone(&client);
        async move { upload_pair(&client, pair).await }
    })
    .await;

    ledger::write_snapshot(&opts.out_ledger, &records)?;

    let ok = records.iter().filter(|r| r.is_ok()).count();
    let summary = PhaseSummary {
        ok,
        failed: records.len() - ok,
    };
    info!(
        ok = summary.ok,
        failed = summary.failed,
        ledger = %opts.out_ledger.display(),
        "Store phase complete"
    );
    Ok(summary)
}

/// Upload one pair; always returns a record.
async fn upload_pair(client: &StoreClient, pair: MediaPair) -> UploadRecord {
    let title = display_title(&pair.stem);

    match upload_steps(client, &pair, &title).await {
        Ok((video_id, embed_url)) => {
            info!(title = %title, video_id = %video_id, "Stored");
            UploadRecord::Ok {
                title,
                video_id,
                embed_url,
                thumbnail: pair.existing_thumbnail().map(|p| p.to_path_buf()),
            }
        }
        Err(e) => {
            error!(title = %title, "Store upload failed: {}", e);
            UploadRecord::Error {
                title,
                error: e.to_string(),
            }
        }
    }
}

/// The three-call sequence for one item, each call with its own retry.
async fn upload_steps(
    client: &StoreClient,
    pair: &MediaPair,
    title: &str,
) -> Result<(String, String), StoreError> {
    let create_policy = RetryConfig::randomized(
        "create_video",
        MAX_ATTEMPTS,
        CREATE_BACKOFF.0,
        CREATE_BACKOFF.1,
    );
    let video_id = retry_async(
        &create_policy,
        || client.create_video(title),
        StoreError::is_retryable,
        StoreError::retry_after_ms,
    )
    .await?;

    let upload_policy = RetryConfig::fixed("upload_video", MAX_ATTEMPTS, UPLOAD_BACKOFF);
    retry_async(
        &upload_policy,
        || client.upload_video(&video_id, &pair.video_path),
        StoreError::is_retryable,
        StoreError::retry_after_ms,
    )
    .await?;

    if let Some(thumb) = pair.existing_thumbnail() {
        let thumb_policy = RetryConfig::fixed("set_thumbnail", MAX_ATTEMPTS, UPLOAD_BACKOFF);
        retry_async(
            &thumb_policy,
            || client.set_thumbnail(&video_id, thumb),
            StoreError::is_retryable,
            StoreError::retry_after_ms,
        )
        .await?;
    }

    let embed_url = client.embed_url(&video_id);
    Ok((video_id, embed_url))
}
