//! Video store REST API client.
//!
//! Consumes the Bunny-Stream-style surface: create a video object,
//! upload its binary, attach a thumbnail. Auth is a static API-key
//! header; every request carries an explicit deadline.

pub mod client;
pub mod error;

pub use client::{StoreClient, StoreConfig};
pub use error::{StoreError, StoreResult};
