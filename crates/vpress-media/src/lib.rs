//! External-tool wrappers for the vpress pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with deadline enforcement
//! - Video download via yt-dlp (MP4 remux + automatic thumbnails)
//! - FFprobe metadata probing
//! - Fallback thumbnail extraction at a randomized timestamp

pub mod command;
pub mod download;
pub mod error;
pub mod probe;
pub mod thumbnail;

pub use command::{check_ffmpeg, check_ffprobe, check_ytdlp, FfmpegCommand, FfmpegRunner};
pub use download::{download_video, DownloadOptions};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, VideoInfo};
pub use thumbnail::{extract_frame, snapshot_timestamp};
