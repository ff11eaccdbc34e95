//! Per-item outcome records for the upload and publish phases.
//!
//! Records serialize with a `status` tag so the ledgers read as
//! `[{"status":"ok",...},{"status":"error",...}]`. Ok upload records
//! carry the local thumbnail path forward so the publish phase can
//! attach a featured image without rescanning the download directory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Outcome of one store-phase item (create + upload + thumbnail).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadRecord {
    Ok {
        title: String,
        video_id: String,
        embed_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thumbnail: Option<PathBuf>,
    },
    Error {
        title: String,
        error: String,
    },
}

impl UploadRecord {
    pub fn title(&self) -> &str {
        match self {
            UploadRecord::Ok { title, .. } | UploadRecord::Error { title, .. } => title,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, UploadRecord::Ok { .. })
    }
}

/// Outcome of one site-phase item (media upload + post create).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PublishRecord {
    Ok { title: String, post_id: u64 },
    Error { title: String, error: String },
}

impl PublishRecord {
    pub fn title(&self) -> &str {
        match self {
            PublishRecord::Ok { title, .. } | PublishRecord::Error { title, .. } => title,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, PublishRecord::Ok { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_record_json_shape() {
        let ok = UploadRecord::Ok {
            title: "Foo Bar".to_string(),
            video_id: "abc-123".to_string(),
            embed_url: "https://iframe.mediadelivery.net/embed/7/abc-123".to_string(),
            thumbnail: None,
        };
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["title"], "Foo Bar");
        assert_eq!(json["video_id"], "abc-123");
        assert!(json.get("thumbnail").is_none());
        assert!(json.get("error").is_none());

        let err = UploadRecord::Error {
            title: "Foo Bar".to_string(),
            error: "create_video [500]: boom".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "create_video [500]: boom");
    }

    #[test]
    fn upload_record_round_trips_with_thumbnail() {
        let ok = UploadRecord::Ok {
            title: "T".to_string(),
            video_id: "v".to_string(),
            embed_url: "e".to_string(),
            thumbnail: Some(PathBuf::from("downloads/001_T.jpg")),
        };
        let back: UploadRecord =
            serde_json::from_str(&serde_json::to_string(&ok).unwrap()).unwrap();
        assert_eq!(back, ok);
    }

    #[test]
    fn publish_record_json_shape() {
        let ok = PublishRecord::Ok {
            title: "Foo".to_string(),
            post_id: 99,
        };
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["post_id"], 99);
        assert!(ok.is_ok());

        let err = PublishRecord::Error {
            title: "Foo".to_string(),
            error: "media upload failed [503]".to_string(),
        };
        assert!(!err.is_ok());
        assert_eq!(err.title(), "Foo");
    }
}
