//! # API crate: the hosted backend client for Taskboard
//!
//! Implements the `store` collaborator traits against a hosted backend-as-a-service
//! (auth, REST records, object storage, realtime). Everything goes through one
//! cheaply cloneable [`HostedBackend`].
//!
//! ## Modules
//!
//! | Module | Target | Purpose |
//! |--------|--------|---------|
//! | [`auth`] | all | Password sign-up/sign-in/sign-out, token refresh, session persistence (`localStorage` in the browser) |
//! | [`config`] | all | Backend URL and anon key, resolved from build env, runtime env, or `taskboard.toml` |
//! | [`models`] | all | Wire shapes of auth responses |
//! | [`realtime`] | codec: all, socket: `wasm32` | Phoenix websocket frames and the change-feed socket |
//! | `rest` | all | `RecordStore` over `/rest/v1/<table>` |
//! | `storage` | all | `ObjectStore` over `/storage/v1/object` |
//!
//! ## Requests
//!
//! Every request carries the project `apikey` header and `Authorization: Bearer`
//! with the session's access token, or the anon key when nobody is signed in.
//! Non-2xx responses are turned into the matching `store::Error` variant with the
//! message from the backend's JSON error body.

pub mod auth;
mod client;
pub mod config;
pub mod models;
pub mod realtime;
mod rest;
mod storage;

pub use client::HostedBackend;
pub use config::BackendConfig;

use store::AppConfig;

impl HostedBackend {
    /// Client for `config`, resolving the backend location with [`BackendConfig::resolve`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, String> {
        let backend = BackendConfig::resolve(&config.backend)?;
        Ok(Self::new(backend).with_realtime_channel(&config.tasks.channel))
    }
}
