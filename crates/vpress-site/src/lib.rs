//! WordPress REST API client.
//!
//! Consumes the two CMS endpoints the publish phase needs: media
//! upload and post creation. Auth is HTTP Basic with an application
//! password.

pub mod client;
pub mod error;

pub use client::{embed_html, SiteClient, SiteConfig, DEFAULT_EMBED_HEIGHT, DEFAULT_EMBED_WIDTH};
pub use error::{SiteError, SiteResult};
