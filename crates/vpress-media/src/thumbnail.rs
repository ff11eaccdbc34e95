//! Fallback thumbnail extraction.
//!
//! When yt-dlp does not deliver a site thumbnail, a single still frame
//! is grabbed with FFmpeg at a randomized timestamp so batch runs do
//! not all snapshot the identical opening frame.

use std::path::Path;

use rand::Rng;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Fixed fallback timestamp for short or unprobeable videos.
const FALLBACK_TS: f64 = 5.0;

/// Deadline for a single frame grab.
const EXTRACT_TIMEOUT_SECS: u64 = 120;

/// Pick the snapshot timestamp for a video of `duration` seconds.
///
/// Uniform in `[5, 0.9 * duration]` when the duration exceeds 10s,
/// otherwise exactly 5s.
pub fn snapshot_timestamp<R: Rng>(duration: f64, rng: &mut R) -> f64 {
    if duration > 10.0 {
        rng.random_range(FALLBACK_TS..=duration * 0.9)
    } else {
        FALLBACK_TS
    }
}

/// Extract a single frame from `video_path` at `ts` seconds.
pub async fn extract_frame(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    ts: f64,
) -> MediaResult<()> {
    let video_path = video_path.as_ref();
    let output_path = output_path.as_ref();

    let cmd = FfmpegCommand::new(video_path, output_path)
        .seek(ts)
        .single_frame()
        .log_level("error");

    FfmpegRunner::new()
        .with_timeout(EXTRACT_TIMEOUT_SECS)
        .run(&cmd)
        .await?;

    info!(
        ts = format!("{:.1}", ts),
        output = %output_path.display(),
        "Thumbnail frame extracted"
    );
    Ok(())
}
