//! # Domain models for tasks and sessions
//!
//! Defines the records exchanged with the hosted backend. Field names match the
//! backend's column names so the same structs deserialize from a bulk select, a
//! realtime change payload, or a stored session.
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`Task`] | A row of the tasks table. `image_url` may be null or the [`EMPTY_IMAGE_MARKER`]. |
//! | [`TaskRecord`] | The write payload sent on insert and update (no `id`, no `created_at`). |
//! | [`User`] | The authenticated identity attached to a session. |
//! | [`Session`] | Access/refresh tokens plus the [`User`]. |
//! | [`AuthEvent`] | One auth-state change delivered to listeners. |
//! | [`Owner`] | The id/email pair every task read and write is scoped to. |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Stored as `image_url` when a task is created without an image.
pub const EMPTY_IMAGE_MARKER: &str = "";

/// Primary key assigned by the record store.
pub type TaskId = i64;

/// A task row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Public URL of the attached image, `None` or `""` when there is none.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Owner email; the authorization filter column.
    pub email: String,
    /// Owner id.
    #[serde(default)]
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// The image URL, treating the empty marker as no image.
    pub fn image(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .filter(|url| *url != EMPTY_IMAGE_MARKER)
    }
}

/// Fields written on insert and update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub title: String,
    pub description: String,
    pub email: String,
    pub user_id: String,
    pub image_url: Option<String>,
}

/// The authenticated user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// Local part of the email address: "alice" for "alice@example.com".
    pub fn display_name(&self) -> &str {
        let email = self.email.as_deref().unwrap_or_default();
        email.split('@').next().unwrap_or(email)
    }

    /// Upper-cased first character of the email, for the avatar badge.
    pub fn avatar_initial(&self) -> String {
        self.email
            .as_deref()
            .and_then(|e| e.chars().next())
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }
}

/// An authenticated session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Expiry of `access_token` in unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl Session {
    pub fn email(&self) -> Option<&str> {
        self.user.email.as_deref()
    }

    /// Whether the access token expires within `margin_secs` of `now_secs`.
    pub fn is_expired(&self, now_secs: i64, margin_secs: i64) -> bool {
        self.expires_at
            .map(|at| at <= now_secs + margin_secs)
            .unwrap_or(false)
    }
}

/// Kind of auth-state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// One auth-state change; the session replaces the holder's session wholesale.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

impl AuthEvent {
    pub fn new(kind: AuthEventKind, session: Option<Session>) -> Self {
        Self { kind, session }
    }
}

/// The identity every task operation is scoped to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Owner {
    pub id: String,
    pub email: String,
}

impl Owner {
    /// Derive the owner from a session. Sessions without an email cannot own tasks.
    pub fn from_session(session: &Session) -> Result<Self> {
        let email = session
            .email()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Error::Auth("You must be logged in to add tasks".to_string()))?;
        Ok(Self {
            id: session.user.id.clone(),
            email: email.to_string(),
        })
    }
}
