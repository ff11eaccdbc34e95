//! Media pairs: the video/thumbnail pairing the fetch phase produces.
//!
//! The pairing used to be implied by a shared filename stem and
//! re-derived by directory scan in later phases. It is formalized here
//! as an explicit record the fetch phase writes to a small manifest
//! (`pairs.json`) in its output directory; the scan remains available
//! as a fallback for directories produced out of band.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ledger::{read_snapshot, write_snapshot, LedgerError};

/// File name of the media-pair manifest inside the download directory.
pub const PAIRS_MANIFEST: &str = "pairs.json";

/// A downloaded video and its optional thumbnail, linked by stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPair {
    /// Shared filename base, `{index:03}_{sanitized_title}`.
    pub stem: String,
    /// Path to the MP4 file.
    pub video_path: PathBuf,
    /// Path to the JPEG thumbnail, when one was produced.
    pub thumbnail_path: Option<PathBuf>,
}

impl MediaPair {
    /// Thumbnail path only if the file actually exists on disk.
    pub fn existing_thumbnail(&self) -> Option<&Path> {
        self.thumbnail_path
            .as_deref()
            .filter(|p| p.exists())
    }
}

/// Write the pair manifest into `dir`.
pub fn write_pairs(dir: &Path, pairs: &[MediaPair]) -> Result<(), LedgerError> {
    write_snapshot(&dir.join(PAIRS_MANIFEST), pairs)
}

/// Load pairs from `dir`: prefer the pair manifest, fall back to a
/// directory scan when it is absent.
pub fn load_pairs(dir: &Path) -> Result<Vec<MediaPair>, LedgerError> {
    let manifest = dir.join(PAIRS_MANIFEST);
    if manifest.exists() {
        read_snapshot(&manifest)
    } else {
        scan_directory(dir)
    }
}

/// Reconstruct pairs by scanning `dir` for `*.mp4` files, picking up a
/// same-stem `.jpg` when present. Results are sorted by stem so the
/// index prefix restores manifest order.
pub fn scan_directory(dir: &Path) -> Result<Vec<MediaPair>, LedgerError> {
    let mut pairs = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("mp4") {
            continue;
        }
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(s) => s.to_string(),
            None => continue,
        };
        let thumb = path.with_extension("jpg");
        pairs.push(MediaPair {
            stem,
            thumbnail_path: thumb.exists().then_some(thumb),
            video_path: path,
        });
    }

    pairs.sort_by(|a, b| a.stem.cmp(&b.stem));
    Ok(pairs)
}
