//! # Collaborator traits: the hosted backend's contracts
//!
//! All persistence, authentication, blob storage, and change notification are
//! delegated to a hosted service. These traits describe exactly what the application
//! needs from it, so the task logic runs unchanged against the HTTP client in the
//! `api` crate or against [`crate::MemoryBackend`] in tests.
//!
//! | Trait | Operations |
//! |-------|-----------|
//! | [`AuthService`] | current session, sign-up, sign-in, sign-out, auth-state subscription |
//! | [`RecordStore`] | filtered select, insert, filtered update, filtered delete, change subscription |
//! | [`ObjectStore`] | upload, public URL |
//!
//! Futures are not required to be `Send`: the browser build runs everything on a
//! single-threaded executor.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::filter::{Filter, Order};
use crate::models::{AuthEvent, Session};
use crate::subscription::Subscription;

/// Authentication collaborator.
pub trait AuthService {
    /// The current session, if any.
    fn get_session(&self) -> impl std::future::Future<Output = Result<Option<Session>>>;

    /// Request account creation. Returns a session only when the service does not
    /// require email confirmation.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<Option<Session>>>;

    /// Request a session for existing credentials.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<Session>>;

    /// Invalidate the current session. Listeners are told via a `SignedOut` event.
    fn sign_out(&self) -> impl std::future::Future<Output = Result<()>>;

    /// Subscribe to auth-state changes until the subscription is dropped.
    fn on_auth_state_change(&self) -> Subscription<AuthEvent>;
}

/// Kind of record change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A raw change notification from the record store.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordChange {
    pub kind: ChangeKind,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

/// Database-like collaborator exposing filtered CRUD and change subscriptions.
pub trait RecordStore {
    fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filter: &Filter,
        order: Option<&Order>,
    ) -> impl std::future::Future<Output = Result<Vec<T>>>;

    fn insert<R: Serialize>(
        &self,
        table: &str,
        record: &R,
    ) -> impl std::future::Future<Output = Result<()>>;

    fn update<R: Serialize>(
        &self,
        table: &str,
        filter: &Filter,
        fields: &R,
    ) -> impl std::future::Future<Output = Result<()>>;

    fn delete(&self, table: &str, filter: &Filter) -> impl std::future::Future<Output = Result<()>>;

    /// Subscribe to changes of rows matching `filter` (a single equality predicate).
    fn subscribe(
        &self,
        table: &str,
        filter: &Filter,
    ) -> impl std::future::Future<Output = Result<Subscription<RecordChange>>>;
}

/// Blob storage collaborator.
pub trait ObjectStore {
    fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> impl std::future::Future<Output = Result<()>>;

    fn public_url(&self, bucket: &str, key: &str) -> String;
}
