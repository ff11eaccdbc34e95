//! Full-pipeline orchestration.
//!
//! Runs fetch, store and publish in order. Any fatal error or
//! non-clean store/publish summary stops the run with nothing cleaned
//! up, so the ledgers stay available for inspection and retry. Only a
//! fully clean run deletes the working directory and both ledgers.

use tracing::{info, warn};

use vpress_site::SiteClient;
use vpress_store::StoreClient;

use crate::error::{PipelineError, PipelineResult};
use crate::fetch::{run_fetch, FetchOptions};
use crate::publish::{run_publish, PublishOptions};
use crate::store::{run_store, StoreOptions};

/// Options for a full pipeline run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub fetch: FetchOptions,
    pub store: StoreOptions,
    pub publish: PublishOptions,
}

/// Run all three phases, then clean up on full success.
///
/// Download failures in the fetch phase do not stop the run (the store
/// phase simply sees fewer pairs); store or publish item failures do.
pub async fn run_all(
    store_client: StoreClient,
    site_client: SiteClient,
    opts: RunOptions,
) -> PipelineResult<()> {
    let fetch_summary = run_fetch(opts.fetch.clone()).await?;
    if !fetch_summary.is_clean() {
        warn!(
            failed = fetch_summary.failed,
            "Some downloads failed; continuing with the rest"
        );
    }

    let store_summary = run_store(store_client, opts.store.clone()).await?;
    if !store_summary.is_clean() {
        return Err(PipelineError::ItemsFailed {
            phase: "store",
            failed: store_summary.failed,
            total: store_summary.total(),
        });
    }

    let publish_summary = run_publish(site_client, opts.publish.clone()).await?;
    if !publish_summary.is_clean() {
        return Err(PipelineError::ItemsFailed {
            phase: "publish",
            failed: publish_summary.failed,
            total: publish_summary.total(),
        });
    }

    cleanup(&opts);
    info!("Pipeline complete");
    Ok(())
}

/// Delete the working directory and both ledgers. Best effort; a
/// failed removal is logged and ignored.
fn cleanup(opts: &RunOptions) {
    info!("Cleaning up working files");

    if opts.fetch.out_dir.is_dir() {
        if let Err(e) = std::fs::remove_dir_all(&opts.fetch.out_dir) {
            warn!(
                dir = %opts.fetch.out_dir.display(),
                "Failed to remove working directory: {}", e
            );
        }
    }
    for ledger in [&opts.store.out_ledger, &opts.publish.out_ledger] {
        if ledger.exists() {
            if let Err(e) = std::fs::remove_file(ledger) {
                warn!(ledger = %ledger.display(), "Failed to remove ledger: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn run_options(root: &Path) -> RunOptions {
        RunOptions {
            fetch: FetchOptions {
                manifest: root.join("upload.txt"),
                out_dir: root.join("downloads"),
                cookies: None,
                workers: 1,
                download_timeout_secs: 5,
            },
            store: StoreOptions {
                dir: root.join("downloads"),
                out_ledger: root.join("store_results.json"),
                workers: 1,
            },
            publish: PublishOptions {
                ledger: root.join("store_results.json"),
                out_ledger: root.join("site_results.json"),
                workers: 1,
                post_status: "publish".to_string(),
                embed_width: 640,
                embed_height: 360,
            },
        }
    }

    #[test]
    fn cleanup_removes_workdir_and_ledgers() {
        let dir = tempfile::tempdir().unwrap();
        let opts = run_options(dir.path());
        std::fs::create_dir_all(&opts.fetch.out_dir).unwrap();
        std::fs::write(opts.fetch.out_dir.join("001_a.mp4"), b"x").unwrap();
        std::fs::write(&opts.store.out_ledger, b"[]").unwrap();
        std::fs::write(&opts.publish.out_ledger, b"[]").unwrap();

        cleanup(&opts);

        assert!(!opts.fetch.out_dir.exists());
        assert!(!opts.store.out_ledger.exists());
        assert!(!opts.publish.out_ledger.exists());
    }

    #[tokio::test]
    async fn missing_manifest_stops_before_any_phase() {
        let dir = tempfile::tempdir().unwrap();
        let opts = run_options(dir.path());

        let store_client =
            StoreClient::new(vpress_store::StoreConfig::new("k", 1)).unwrap();
        let site_client = SiteClient::new(
            vpress_site::SiteConfig::new("https://example.com", "u", "p").unwrap(),
        )
        .unwrap();

        let err = run_all(store_client, site_client, opts).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput(_)));
        assert!(!dir.path().join("store_results.json").exists());
    }
}
