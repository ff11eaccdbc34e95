//! Credential and endpoint resolution.
//!
//! Flags win over environment variables; the environment is loaded
//! once (dotenv included) by the binary before any phase starts.
//! Nothing is ever baked in: missing credentials are fatal
//! preconditions, reported before any work is submitted.

use vpress_site::SiteConfig;
use vpress_store::StoreConfig;

use crate::error::{PipelineError, PipelineResult};

/// Resolve the store configuration from flags, falling back to
/// `BUNNY_API_KEY` / `BUNNY_LIBRARY_ID`.
pub fn resolve_store_config(
    api_key: Option<String>,
    library_id: Option<u64>,
) -> PipelineResult<StoreConfig> {
    let api_key = api_key
        .or_else(|| std::env::var("BUNNY_API_KEY").ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            PipelineError::config("Store API key required: pass --api-key or set BUNNY_API_KEY")
        })?;

    let library_id = match library_id {
        Some(id) => id,
        None => std::env::var("BUNNY_LIBRARY_ID")
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                PipelineError::config(
                    "Store library id required: pass --library or set BUNNY_LIBRARY_ID",
                )
            })?,
    };

    let mut config = StoreConfig::new(api_key, library_id);
    if let Ok(base) = std::env::var("BUNNY_API_BASE") {
        config.base_url = base;
    }
    if let Ok(base) = std::env::var("BUNNY_EMBED_BASE") {
        config.embed_base = base;
    }
    Ok(config)
}

/// Resolve the site configuration from flags, falling back to
/// `WP_SITE` / `WP_USER` / `WP_APP_PW`.
pub fn resolve_site_config(
    site: Option<String>,
    user: Option<String>,
    password: Option<String>,
) -> PipelineResult<SiteConfig> {
    let site = site
        .or_else(|| std::env::var("WP_SITE").ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PipelineError::config("Site URL required: pass --site or set WP_SITE"))?;

    let user = user
        .or_else(|| std::env::var("WP_USER").ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PipelineError::config("Site user required: pass --user or set WP_USER"))?;

    let password = password
        .or_else(|| std::env::var("WP_APP_PW").ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            PipelineError::config("Site password required: pass --password or set WP_APP_PW")
        })?;

    Ok(SiteConfig::new(site, user, password)?)
}

/// Default fetch pool size: host parallelism.
pub fn default_fetch_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "BUNNY_API_KEY",
            "BUNNY_LIBRARY_ID",
            "BUNNY_API_BASE",
            "BUNNY_EMBED_BASE",
            "WP_SITE",
            "WP_USER",
            "WP_APP_PW",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn flags_win_over_env() {
        clear_env();
        std::env::set_var("BUNNY_API_KEY", "env-key");
        std::env::set_var("BUNNY_LIBRARY_ID", "1");
        let config = resolve_store_config(Some("flag-key".to_string()), Some(2)).unwrap();
        assert_eq!(config.api_key, "flag-key");
        assert_eq!(config.library_id, 2);
        clear_env();
    }

    #[test]
    #[serial]
    fn env_fills_missing_flags() {
        clear_env();
        std::env::set_var("BUNNY_API_KEY", "env-key");
        std::env::set_var("BUNNY_LIBRARY_ID", "7");
        let config = resolve_store_config(None, None).unwrap();
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.library_id, 7);
        clear_env();
    }

    #[test]
    #[serial]
    fn missing_store_credentials_are_fatal() {
        clear_env();
        let err = resolve_store_config(None, None).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(err.to_string().contains("BUNNY_API_KEY"));
    }

    #[test]
    #[serial]
    fn missing_site_credentials_are_fatal() {
        clear_env();
        let err = resolve_site_config(Some("https://example.com".to_string()), None, None)
            .unwrap_err();
        assert!(err.to_string().contains("WP_USER"));
    }

    #[test]
    #[serial]
    fn site_config_resolves_fully_from_env() {
        clear_env();
        std::env::set_var("WP_SITE", "https://example.com/");
        std::env::set_var("WP_USER", "admin");
        std::env::set_var("WP_APP_PW", "pw");
        let config = resolve_site_config(None, None, None).unwrap();
        assert_eq!(config.base_url, "https://example.com");
        assert_eq!(config.username, "admin");
        clear_env();
    }
}
