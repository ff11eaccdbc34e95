//! Fetch phase: manifest in, MP4/JPG pairs out.
//!
//! Each manifest entry is processed by one worker: download via
//! yt-dlp (which also fetches the site thumbnail when one exists),
//! then an FFmpeg frame grab as thumbnail fallback. A failed download
//! abandons the entry; a failed frame grab leaves the video without a
//! thumbnail. Neither affects sibling entries.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use vpress_media::{download_video, extract_frame, probe_video, snapshot_timestamp, DownloadOptions};
use vpress_models::{parse_manifest, pair, stem, ManifestEntry, MediaPair};

use crate::error::{PipelineError, PipelineResult};
use crate::pool::{fan_out, PhaseSummary};

/// Options for the fetch phase.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Manifest file of `url - title` lines.
    pub manifest: PathBuf,
    /// Output directory for MP4/JPG pairs and `pairs.json`.
    pub out_dir: PathBuf,
    /// Cookie file for age-gated sites; ignored when absent.
    pub cookies: Option<PathBuf>,
    /// Worker pool size.
    pub workers: usize,
    /// Per-download deadline in seconds.
    pub download_timeout_secs: u64,
}

/// Run the fetch phase.
///
/// Fatal only when the manifest is missing or yields zero entries;
/// per-entry failures are logged and reflected in the summary.
pub async fn run_fetch(opts: FetchOptions) -> PipelineResult<PhaseSummary> {
    if !opts.manifest.exists() {
        return Err(PipelineError::MissingInput(opts.manifest));
    }

    let text = std::fs::read_to_string(&opts.manifest)?;
    let entries = parse_manifest(&text);
    if entries.is_empty() {
        return Err(PipelineError::EmptyManifest(opts.manifest));
    }

    std::fs::create_dir_all(&opts.out_dir)?;

    info!(
        entries = entries.len(),
        workers = opts.workers,
        out_dir = %opts.out_dir.display(),
        "Starting fetch phase"
    );

    let opts = Arc::new(opts);
    let total = entries.len();

    let task_opts = Arc::clone(&opts);
    let results = fan_out(opts.workers, entries, move |index, entry| {
        let opts = Arc::clone(&task_opts);
        // Manifest position is 1-based for file naming.
        async move { fetch_entry(index + 1, entry, &opts).await }
    })
    .await;

    let pairs: Vec<MediaPair> = results.into_iter().flatten().collect();
    pair::write_pairs(&opts.out_dir, &pairs)?;

    let summary = PhaseSummary {
        ok: pairs.len(),
        failed: total - pairs.len(),
    };
    info!(
        ok = summary.ok,
        failed = summary.failed,
        "Fetch phase complete"
    );
    Ok(summary)
}

/// Download one entry and ensure its thumbnail; `None` when the
/// download itself failed.
async fn fetch_entry(seq: usize, entry: ManifestEntry, opts: &FetchOptions) -> Option<MediaPair> {
    let stem = stem(seq, &entry.title);
    let video_path = opts.out_dir.join(format!("{}.mp4", stem));

    let download_opts = DownloadOptions {
        cookies: opts.cookies.clone(),
        timeout_secs: opts.download_timeout_secs,
    };

    if let Err(e) = download_video(&entry.url, &video_path, &download_opts).await {
        error!(stem = %stem, url = %entry.url, "Download failed: {}", e);
        return None;
    }

    let thumb_path = video_path.with_extension("jpg");
    if thumb_path.exists() {
        info!(stem = %stem, "Thumbnail downloaded with video");
    } else {
        // Fall back to an FFmpeg snapshot at a randomized timestamp.
        let duration = match probe_video(&video_path).await {
            Ok(info) => info.duration,
            Err(e) => {
                warn!(stem = %stem, "Probe failed, using fallback timestamp: {}", e);
                0.0
            }
        };
        let ts = snapshot_timestamp(duration, &mut rand::rng());
        if let Err(e) = extract_frame(&video_path, &thumb_path, ts).await {
            warn!(stem = %stem, "Unable to generate thumbnail: {}", e);
        }
    }

    Some(MediaPair {
        stem,
        thumbnail_path: thumb_path.exists().then_some(thumb_path),
        video_path,
    })
}
