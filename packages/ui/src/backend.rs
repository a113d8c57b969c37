//! Shared backend constructor.
//!
//! Reads the bundled `taskboard.toml` and builds the [`api::HostedBackend`] every
//! component reaches through context. The backend location may be overridden from the
//! environment (see [`api::BackendConfig::resolve`]).

use store::AppConfig;

/// The backend type provided to components.
pub type Backend = api::HostedBackend;

/// Parse the bundled configuration. A malformed file is logged and replaced by defaults.
pub fn load_config(raw: &str) -> AppConfig {
    match AppConfig::from_toml(raw) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("invalid {}: {e}", AppConfig::filename());
            AppConfig::default()
        }
    }
}

/// Create the hosted backend client for `config`.
///
/// When no backend location resolves, the client is still built from whatever the
/// `[backend]` section holds so every request fails with a visible error instead of
/// the app refusing to start.
pub fn make_backend(config: &AppConfig) -> Backend {
    match api::HostedBackend::from_app_config(config) {
        Ok(backend) => backend,
        Err(e) => {
            tracing::error!("backend is not configured: {e}");
            let fallback = api::BackendConfig::new(
                config.backend.url.clone(),
                config.backend.anon_key.clone(),
            );
            api::HostedBackend::new(fallback).with_realtime_channel(&config.tasks.channel)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::InsertPolicy;

    #[test]
    fn test_load_config_reads_sections() {
        let config = load_config(
            r#"
            [backend]
            url = "https://demo.supabase.co"
            anon_key = "anon"

            [sync]
            insert_policy = "always-prepend"
            "#,
        );
        assert_eq!(config.backend.url, "https://demo.supabase.co");
        assert_eq!(config.tasks.table, "tasks");
        assert_eq!(config.sync.insert_policy, InsertPolicy::AlwaysPrepend);
    }

    #[test]
    fn test_load_config_falls_back_to_defaults() {
        assert_eq!(load_config("[tasks\nbroken"), AppConfig::default());
    }
}
