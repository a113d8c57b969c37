//! Password authentication against the hosted auth service.
//!
//! [`HostedBackend`] caches the current session, persists it with [`session`], and
//! refreshes the access token when it is about to expire. Every change of the cached
//! session is announced to `on_auth_state_change` subscribers.

pub mod session;

use reqwest::StatusCode;
use serde::Serialize;
use store::clock::now_secs;
use store::{AuthEvent, AuthEventKind, AuthService, Error, Result, Session, Subscription};

use crate::client::{lock, send, with_token, HostedBackend};
use crate::models::{SignUpResponse, TokenResponse};

pub use session::SESSION_STORAGE_KEY;

/// Refresh the access token when it expires within this many seconds.
pub const REFRESH_MARGIN_SECS: i64 = 30;

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

/// Logout answers these when the token is already invalid; the session is gone either way.
fn is_stale_session(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND)
}

impl HostedBackend {
    async fn request_token<B: Serialize>(&self, grant_type: &str, body: &B) -> Result<Session> {
        let url = self
            .config
            .endpoint(&format!("/auth/v1/token?grant_type={grant_type}"));
        let request = self
            .http
            .post(url)
            .header("apikey", &self.config.anon_key)
            .json(body);
        let response = send(request, Error::Auth).await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Auth(e.to_string()))?;
        Ok(token.into_session(now_secs()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        self.request_token("refresh_token", &RefreshGrant { refresh_token })
            .await
    }
}

impl AuthService for HostedBackend {
    async fn get_session(&self) -> Result<Option<Session>> {
        let Some(current) = self.cached_session() else {
            return Ok(None);
        };
        if !current.is_expired(now_secs(), REFRESH_MARGIN_SECS) {
            return Ok(Some(current));
        }

        tracing::debug!("access token expired, refreshing");
        match self.refresh(&current.refresh_token).await {
            Ok(fresh) => {
                self.store_session(Some(fresh.clone()), Some(AuthEventKind::TokenRefreshed));
                Ok(Some(fresh))
            }
            Err(e) => {
                tracing::warn!("session refresh failed: {e}");
                self.store_session(None, Some(AuthEventKind::SignedOut));
                Err(e)
            }
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>> {
        let request = self
            .http
            .post(self.config.endpoint("/auth/v1/signup"))
            .header("apikey", &self.config.anon_key)
            .json(&Credentials { email, password });
        let response = send(request, Error::Auth).await?;
        let body: SignUpResponse = response
            .json()
            .await
            .map_err(|e| Error::Auth(e.to_string()))?;

        match body {
            SignUpResponse::Session(token) => {
                let session = token.into_session(now_secs());
                self.store_session(Some(session.clone()), Some(AuthEventKind::SignedIn));
                Ok(Some(session))
            }
            SignUpResponse::PendingUser(user) => {
                tracing::debug!(user = %user.id, "sign-up pending email confirmation");
                Ok(None)
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self
            .request_token("password", &Credentials { email, password })
            .await?;
        self.store_session(Some(session.clone()), Some(AuthEventKind::SignedIn));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        if self.cached_session().is_some() {
            // The cached token is sent as is: an expired one is already signed out.
            let request = with_token(
                self.http.post(self.config.endpoint("/auth/v1/logout")),
                &self.config.anon_key,
                &self.bearer(),
            );
            let response = request
                .send()
                .await
                .map_err(|e| Error::Auth(e.to_string()))?;
            let status = response.status();
            if !status.is_success() && !is_stale_session(status) {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::Auth(crate::client::error_message(status, &body)));
            }
        }
        self.store_session(None, Some(AuthEventKind::SignedOut));
        Ok(())
    }

    fn on_auth_state_change(&self) -> Subscription<AuthEvent> {
        lock(&self.listeners).subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use store::User;

    fn backend() -> HostedBackend {
        HostedBackend::new(BackendConfig::new("http://127.0.0.1:9", "anon"))
    }

    fn session(expires_at: Option<i64>) -> Session {
        Session {
            access_token: "jwt".into(),
            refresh_token: "r1".into(),
            expires_at,
            user: User {
                id: "u1".into(),
                email: Some("a@b.com".into()),
            },
        }
    }

    #[tokio::test]
    async fn test_get_session_without_session_is_none() {
        assert_eq!(backend().get_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_session_returns_fresh_session_without_network() {
        let backend = backend();
        let current = session(Some(now_secs() + 3_600));
        backend.store_session(Some(current.clone()), None);
        assert_eq!(backend.get_session().await.unwrap(), Some(current));
    }

    #[tokio::test]
    async fn test_sign_out_without_session_emits_signed_out() {
        let backend = backend();
        let mut events = backend.on_auth_state_change();
        backend.sign_out().await.unwrap();
        let event = events.next_event().await.unwrap();
        assert_eq!(event.kind, AuthEventKind::SignedOut);
        assert_eq!(event.session, None);
    }

    #[tokio::test]
    async fn test_clones_share_listeners() {
        let backend = backend();
        let mut events = backend.on_auth_state_change();
        let other = backend.clone();
        other.store_session(Some(session(None)), Some(AuthEventKind::SignedIn));
        let event = events.next_event().await.unwrap();
        assert_eq!(event.kind, AuthEventKind::SignedIn);
        assert_eq!(backend.cached_session(), Some(session(None)));
    }

    #[test]
    fn test_stale_logout_statuses() {
        assert!(is_stale_session(StatusCode::UNAUTHORIZED));
        assert!(is_stale_session(StatusCode::NOT_FOUND));
        assert!(!is_stale_session(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
