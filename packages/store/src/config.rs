//! # Application configuration: `taskboard.toml`
//!
//! The TOML file bundled with the web app that names the hosted backend and the
//! table, bucket, and realtime channel the tasks live in.
//!
//! ## Structure
//!
//! ```toml
//! [backend]
//! url = "https://project.supabase.co"
//! anon_key = "public-anon-key"
//!
//! [tasks]
//! table = "tasks"
//! bucket = "task-images"
//! channel = "tasks-channel"
//! owner_column = "email"
//!
//! [sync]
//! insert_policy = "replace-existing"   # or "always-prepend"
//! ```
//!
//! ## Types
//!
//! | Struct | Purpose |
//! |--------|---------|
//! | [`AppConfig`] | Top-level config with TOML (de)serialisation and the canonical filename. |
//! | [`BackendSection`] | Project URL and public (anon) API key. |
//! | [`TasksConfig`] | Table, image bucket, realtime channel, owner filter column. |
//! | [`SyncConfig`] | Reconciler [`InsertPolicy`]. |
//!
//! Every section has defaults, so a missing or empty file is equivalent to the
//! default configuration.

use serde::{Deserialize, Serialize};

use crate::task_list::InsertPolicy;

/// Top-level configuration stored in `taskboard.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub tasks: TasksConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Hosted backend location.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendSection {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
}

/// Where tasks and their images are stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TasksConfig {
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Column every read, write, and subscription is filtered on.
    #[serde(default = "default_owner_column")]
    pub owner_column: String,
}

fn default_table() -> String {
    "tasks".to_string()
}

fn default_bucket() -> String {
    "task-images".to_string()
}

fn default_channel() -> String {
    "tasks-channel".to_string()
}

fn default_owner_column() -> String {
    "email".to_string()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            bucket: default_bucket(),
            channel: default_channel(),
            owner_column: default_owner_column(),
        }
    }
}

/// Live update settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub insert_policy: InsertPolicy,
}

impl AppConfig {
    /// Create a config pointing at the given backend.
    pub fn new(url: String, anon_key: String) -> Self {
        Self {
            backend: BackendSection { url, anon_key },
            ..Self::default()
        }
    }

    /// Builder method to set the insert policy.
    pub fn with_insert_policy(mut self, policy: InsertPolicy) -> Self {
        self.sync.insert_policy = policy;
        self
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "taskboard.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.tasks.table, "tasks");
        assert_eq!(config.tasks.bucket, "task-images");
        assert_eq!(config.tasks.owner_column, "email");
        assert_eq!(config.sync.insert_policy, InsertPolicy::ReplaceExisting);
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::from_toml(
            r#"
            [backend]
            url = "https://demo.supabase.co"

            [sync]
            insert_policy = "always-prepend"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.url, "https://demo.supabase.co");
        assert_eq!(config.backend.anon_key, "");
        assert_eq!(config.tasks, TasksConfig::default());
        assert_eq!(config.sync.insert_policy, InsertPolicy::AlwaysPrepend);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = AppConfig::new("https://x.supabase.co".into(), "anon".into())
            .with_insert_policy(InsertPolicy::AlwaysPrepend);
        let text = config.to_toml().unwrap();
        assert!(text.contains("insert_policy = \"always-prepend\""));
        assert_eq!(AppConfig::from_toml(&text).unwrap(), config);
    }
}
