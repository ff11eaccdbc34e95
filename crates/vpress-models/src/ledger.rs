//! Ledger persistence.
//!
//! A ledger is an ordered list of per-item records written once, as a
//! single pretty-printed JSON array, at the end of a phase. There is no
//! incremental persistence: a crash mid-run loses that run's records.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors reading or writing ledgers and pair manifests.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write `records` to `path` as a pretty-printed JSON array.
pub fn write_snapshot<T: Serialize>(path: &Path, records: &[T]) -> LedgerResult<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a JSON array of records from `path`.
pub fn read_snapshot<T: DeserializeOwned>(path: &Path) -> LedgerResult<Vec<T>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::UploadRecord;

    #[test]
    fn snapshot_round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store_results.json");

        let records = vec![
            UploadRecord::Ok {
                title: "A".to_string(),
                video_id: "1".to_string(),
                embed_url: "e1".to_string(),
                thumbnail: None,
            },
            UploadRecord::Error {
                title: "B".to_string(),
                error: "boom".to_string(),
            },
        ];
        write_snapshot(&path, &records).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        // Pretty-printed array, one record object per block.
        assert!(text.starts_with('['));
        assert!(text.contains("\n  {"));

        let back: Vec<UploadRecord> = read_snapshot(&path).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn read_missing_file_is_io_error() {
        let err = read_snapshot::<UploadRecord>(Path::new("/nonexistent/ledger.json"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Io(_)));
    }
}
