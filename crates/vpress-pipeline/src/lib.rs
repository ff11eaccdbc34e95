//! Phase drivers for the vpress pipeline.
//!
//! Each phase (fetch, store, publish) is a bounded fan-out over its
//! input items: per-item failures are isolated, logged and recorded,
//! never propagated to sibling items. Fatal precondition errors
//! (missing inputs, missing credentials, nothing to do) surface as
//! `PipelineError` before any work starts.

pub mod config;
pub mod error;
pub mod fetch;
pub mod orchestrate;
pub mod pool;
pub mod publish;
pub mod retry;
pub mod store;

pub use config::{resolve_site_config, resolve_store_config};
pub use error::{PipelineError, PipelineResult};
pub use fetch::{run_fetch, FetchOptions};
pub use orchestrate::{run_all, RunOptions};
pub use pool::{fan_out, PhaseSummary};
pub use publish::{run_publish, PublishOptions};
pub use retry::{retry_async, Backoff, RetryConfig};
pub use store::{run_store, StoreOptions};
