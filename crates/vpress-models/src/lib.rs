//! Shared data model for the vpress pipeline.
//!
//! This crate holds everything the three phases exchange: manifest
//! entries, filename stems, media pairs, per-item outcome records and
//! the JSON ledgers they are persisted in. It has no I/O beyond plain
//! filesystem reads/writes so every phase crate can depend on it.

pub mod ledger;
pub mod manifest;
pub mod pair;
pub mod record;

pub use ledger::{read_snapshot, write_snapshot, LedgerError, LedgerResult};
pub use manifest::{display_title, parse_manifest, sanitize_title, stem, ManifestEntry};
pub use pair::{load_pairs, scan_directory, write_pairs, MediaPair, PAIRS_MANIFEST};
pub use record::{PublishRecord, UploadRecord};
