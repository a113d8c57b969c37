//! Session holder: the single owner of the current authenticated identity.

use crate::backend::AuthService;
use crate::error::Result;
use crate::models::{AuthEvent, Owner, Session};

/// Tracks the current session (or none).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionHolder {
    session: Option<Session>,
}

impl SessionHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// The owner derived from the current session, if it has an email.
    pub fn owner(&self) -> Option<Owner> {
        self.session
            .as_ref()
            .and_then(|s| Owner::from_session(s).ok())
    }

    /// Fetch the current session once at startup.
    ///
    /// A failed fetch leaves no session and is returned to the caller for logging.
    pub async fn initialize<A: AuthService>(&mut self, auth: &A) -> Result<()> {
        let fetched = auth.get_session().await;
        self.set_initial(fetched)
    }

    /// Apply the outcome of a startup session fetch.
    pub fn set_initial(&mut self, fetched: Result<Option<Session>>) -> Result<()> {
        match fetched {
            Ok(session) => {
                self.session = session;
                Ok(())
            }
            Err(err) => {
                self.session = None;
                Err(err)
            }
        }
    }

    /// Replace the session with the event's payload. No merging.
    pub fn on_auth_state_change(&mut self, event: AuthEvent) {
        tracing::debug!(kind = ?event.kind, signed_in = event.session.is_some(), "auth state changed");
        self.session = event.session;
    }

    /// Ask the auth service to end the session.
    ///
    /// The local session is not cleared here; the `SignedOut` event that follows does.
    pub async fn sign_out<A: AuthService>(auth: &A) -> Result<()> {
        auth.sign_out().await
    }
}
