//! Backend location and public API key.
//!
//! Resolution order, first hit wins:
//! 1. values baked in at build time (`TASKBOARD_BACKEND_URL`, `TASKBOARD_ANON_KEY`),
//! 2. on native targets, the same variables at runtime (`.env` is honored),
//! 3. the `[backend]` section of `taskboard.toml`.

use store::config::BackendSection;

const URL_VAR: &str = "TASKBOARD_BACKEND_URL";
const KEY_VAR: &str = "TASKBOARD_ANON_KEY";

/// Hosted backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Project URL without trailing slash: `https://project.supabase.co`
    pub url: String,
    /// Public (anon) API key sent as `apikey` on every request.
    pub anon_key: String,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    /// Use the `[backend]` section of the app config.
    pub fn from_section(section: &BackendSection) -> Result<Self, String> {
        if section.url.is_empty() {
            return Err("backend.url is not set".to_string());
        }
        if section.anon_key.is_empty() {
            return Err("backend.anon_key is not set".to_string());
        }
        Ok(Self::new(section.url.clone(), section.anon_key.clone()))
    }

    /// Values compiled into the binary, if both were set at build time.
    pub fn from_build_env() -> Option<Self> {
        let url = option_env!("TASKBOARD_BACKEND_URL")?;
        let anon_key = option_env!("TASKBOARD_ANON_KEY")?;
        Some(Self::new(url, anon_key))
    }

    /// Read from environment variables, loading `.env` first.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let url = std::env::var(URL_VAR).map_err(|_| format!("{URL_VAR} not set"))?;
        let anon_key = std::env::var(KEY_VAR).map_err(|_| format!("{KEY_VAR} not set"))?;
        Ok(Self::new(url, anon_key))
    }

    /// Runtime environment is not available in the browser.
    #[cfg(target_arch = "wasm32")]
    pub fn from_env() -> Result<Self, String> {
        Err(format!("{URL_VAR} and {KEY_VAR} can only be set at build time"))
    }

    /// Apply the resolution order documented on this module.
    pub fn resolve(section: &BackendSection) -> Result<Self, String> {
        if let Some(config) = Self::from_build_env() {
            return Ok(config);
        }
        match Self::from_env() {
            Ok(config) => Ok(config),
            Err(_) => Self::from_section(section),
        }
    }

    /// Absolute URL for a path under the project: `endpoint("/rest/v1/tasks")`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }

    /// Websocket URL of the realtime service.
    pub fn realtime_url(&self) -> String {
        let base = if let Some(rest) = self.url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.url.clone()
        };
        format!(
            "{base}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            self.anon_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = BackendConfig::new("https://demo.supabase.co/", "anon");
        assert_eq!(config.endpoint("/rest/v1/tasks"), "https://demo.supabase.co/rest/v1/tasks");
    }

    #[test]
    fn test_realtime_url_scheme() {
        let secure = BackendConfig::new("https://demo.supabase.co", "anon");
        assert_eq!(
            secure.realtime_url(),
            "wss://demo.supabase.co/realtime/v1/websocket?apikey=anon&vsn=1.0.0"
        );
        let local = BackendConfig::new("http://localhost:54321", "anon");
        assert!(local.realtime_url().starts_with("ws://localhost:54321/realtime/v1/websocket"));
    }

    #[test]
    fn test_from_section_requires_both_values() {
        let mut section = BackendSection::default();
        assert!(BackendConfig::from_section(&section).is_err());
        section.url = "https://demo.supabase.co".into();
        assert_eq!(
            BackendConfig::from_section(&section).unwrap_err(),
            "backend.anon_key is not set"
        );
        section.anon_key = "anon".into();
        assert_eq!(
            BackendConfig::from_section(&section).unwrap(),
            BackendConfig::new("https://demo.supabase.co", "anon")
        );
    }
}
