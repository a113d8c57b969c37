//! The hosted backend client shared by the auth, record, and storage impls.

use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::{RequestBuilder, Response, StatusCode};
use store::{AuthEvent, AuthService, Error, Listeners, Result, Session};

use crate::auth::session as persist;
use crate::config::BackendConfig;

/// Client for the hosted backend-as-a-service.
///
/// Cloning is cheap and clones share the cached session and auth listeners.
#[derive(Clone)]
pub struct HostedBackend {
    pub(crate) config: BackendConfig,
    pub(crate) http: reqwest::Client,
    pub(crate) session: Arc<Mutex<Option<Session>>>,
    pub(crate) listeners: Arc<Mutex<Listeners<AuthEvent>>>,
    pub(crate) channel: Option<String>,
}

impl HostedBackend {
    pub fn new(config: BackendConfig) -> Self {
        let stored = persist::load();
        Self {
            config,
            http: reqwest::Client::new(),
            session: Arc::new(Mutex::new(stored)),
            listeners: Arc::new(Mutex::new(Listeners::default())),
            channel: None,
        }
    }

    /// Name of the realtime channel joined by subscriptions (default `<table>-channel`).
    pub fn with_realtime_channel(mut self, channel: &str) -> Self {
        self.channel = Some(channel.to_string());
        self
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub(crate) fn cached_session(&self) -> Option<Session> {
        lock(&self.session).clone()
    }

    /// Cache and persist `session` (or clear both), then notify listeners.
    pub(crate) fn store_session(&self, session: Option<Session>, event: Option<store::AuthEventKind>) {
        match &session {
            Some(s) => persist::save(s),
            None => persist::clear(),
        }
        *lock(&self.session) = session.clone();
        if let Some(kind) = event {
            lock(&self.listeners).emit(&AuthEvent::new(kind, session));
        }
    }

    /// Cached bearer token, never refreshed: the session's access token, or the anon
    /// key when signed out.
    pub(crate) fn bearer(&self) -> String {
        self.cached_session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.config.anon_key.clone())
    }

    /// Bearer token for the next request.
    ///
    /// Goes through `get_session`, so an access token about to expire is exchanged
    /// for a fresh one first. A failed refresh signs the user out and is returned.
    pub(crate) async fn access_token(&self) -> Result<String> {
        Ok(self
            .get_session()
            .await?
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.config.anon_key.clone()))
    }

    /// Attach the project key and a current bearer token.
    pub(crate) async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.access_token().await?;
        Ok(with_token(request, &self.config.anon_key, &token))
    }
}

pub(crate) fn with_token(request: RequestBuilder, anon_key: &str, token: &str) -> RequestBuilder {
    request.header("apikey", anon_key).bearer_auth(token)
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Send a request, turning transport failures and non-2xx responses into `wrap(message)`.
pub(crate) async fn send(request: RequestBuilder, wrap: fn(String) -> Error) -> Result<Response> {
    let response = request.send().await.map_err(|e| wrap(e.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    tracing::debug!(%status, %message, "backend request failed");
    Err(wrap(message))
}

/// Extract the human-readable message from an error body.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
