//! # Token responses
//!
//! The auth service answers sign-in and refresh with a token response: access and
//! refresh tokens, a lifetime, and the user. Sign-up answers with the same shape when
//! email confirmation is disabled, and with the bare user object otherwise.
//!
//! [`TokenResponse::into_session`] turns the wire shape into a [`store::Session`],
//! computing `expires_at` from `expires_in` when the service omits it.

use serde::Deserialize;
use store::{Session, User};

/// Response of `POST /auth/v1/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl TokenResponse {
    pub fn into_session(self, now_secs: i64) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| now_secs + secs));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Response of `POST /auth/v1/signup`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    /// Confirmation disabled: the new user is signed in right away.
    Session(TokenResponse),
    /// Confirmation required: only the pending user is returned.
    PendingUser(User),
}
