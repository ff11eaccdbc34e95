//! Pipeline error types.
//!
//! These are the fatal errors of a phase run. Per-item failures never
//! appear here; they are recorded in the phase ledger instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for phase drivers.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input file not found: {0}")]
    MissingInput(PathBuf),

    #[error("No URL-title pairs detected in {0}")]
    EmptyManifest(PathBuf),

    #[error("No media pairs found in {0}; run the fetch phase first")]
    NoMedia(PathBuf),

    #[error("No successful upload records in {0}")]
    NothingToPublish(PathBuf),

    #[error("{failed} of {total} items failed in the {phase} phase")]
    ItemsFailed {
        phase: &'static str,
        failed: usize,
        total: usize,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Ledger(#[from] vpress_models::LedgerError),

    #[error(transparent)]
    Store(#[from] vpress_store::StoreError),

    #[error(transparent)]
    Site(#[from] vpress_site::SiteError),

    #[error(transparent)]
    Media(#[from] vpress_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True when the run completed but some items failed; callers map
    /// this to exit code 1 instead of the fatal-precondition code.
    pub fn is_partial_failure(&self) -> bool {
        matches!(self, PipelineError::ItemsFailed { .. })
    }
}
