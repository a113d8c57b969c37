//! Credential form: local validation and sign-in / sign-up submission.

use crate::backend::AuthService;
use crate::error::{Error, Result};
use crate::models::Session;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Which request the credential form sends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

impl AuthMode {
    pub fn toggled(self) -> Self {
        match self {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AuthMode::SignIn => "Sign In",
            AuthMode::SignUp => "Create an Account",
        }
    }

    pub fn submit_label(self) -> &'static str {
        match self {
            AuthMode::SignIn => "Sign In",
            AuthMode::SignUp => "Sign Up",
        }
    }

    pub fn toggle_label(self) -> &'static str {
        match self {
            AuthMode::SignIn => "Don't have an account? Sign Up",
            AuthMode::SignUp => "Already have an account? Sign In",
        }
    }
}

/// Result of a successful submission.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthOutcome {
    SignedIn(Session),
    /// The account exists but must be confirmed out of band before sign-in.
    VerificationPending,
}

impl AuthOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            AuthOutcome::SignedIn(_) => "Signed in successfully!",
            AuthOutcome::VerificationPending => {
                "Sign up successful! Please check your email for verification."
            }
        }
    }
}

/// Check the form locally, before any network call.
pub fn validate(mode: AuthMode, email: &str, password: &str) -> Result<()> {
    if email.is_empty() || password.is_empty() {
        return Err(Error::Validation("Please fill in all fields".to_string()));
    }
    if !email.contains('@') {
        return Err(Error::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    if mode == AuthMode::SignUp && password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

/// Validate, then send the request for `mode`. Auth failures are returned verbatim.
pub async fn submit<A: AuthService>(
    auth: &A,
    mode: AuthMode,
    email: &str,
    password: &str,
) -> Result<AuthOutcome> {
    validate(mode, email, password)?;
    match mode {
        AuthMode::SignUp => {
            auth.sign_up(email, password).await?;
            Ok(AuthOutcome::VerificationPending)
        }
        AuthMode::SignIn => auth
            .sign_in(email, password)
            .await
            .map(AuthOutcome::SignedIn),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;

    #[test]
    fn test_validation_rules() {
        let invalid = |mode, email, password| validate(mode, email, password).unwrap_err().to_string();

        assert_eq!(invalid(AuthMode::SignIn, "", "x"), "Please fill in all fields");
        assert_eq!(invalid(AuthMode::SignIn, "a@b.com", ""), "Please fill in all fields");
        assert_eq!(
            invalid(AuthMode::SignIn, "ab.com", "secret"),
            "Please enter a valid email address"
        );
        assert_eq!(
            invalid(AuthMode::SignUp, "a@b.com", "12345"),
            "Password must be at least 6 characters long"
        );
        // Short passwords are only rejected on sign-up.
        assert!(validate(AuthMode::SignIn, "a@b.com", "12345").is_ok());
        assert!(validate(AuthMode::SignUp, "a@b.com", "123456").is_ok());
    }

    #[tokio::test]
    async fn test_short_sign_up_password_makes_no_call() {
        let backend = MemoryBackend::new();
        let err = submit(&backend, AuthMode::SignUp, "a@b.com", "12345")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::Validation("Password must be at least 6 characters long".into())
        );
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sign_up_reports_pending_verification() {
        let backend = MemoryBackend::new().with_email_confirmation();
        let outcome = submit(&backend, AuthMode::SignUp, "a@b.com", "secret1")
            .await
            .unwrap();
        assert_eq!(outcome, AuthOutcome::VerificationPending);
        assert_eq!(
            outcome.message(),
            "Sign up successful! Please check your email for verification."
        );
    }

    #[tokio::test]
    async fn test_sign_in_error_is_verbatim() {
        let backend = MemoryBackend::new();
        let err = submit(&backend, AuthMode::SignIn, "a@b.com", "secret1")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_sign_in_returns_session() {
        let backend = MemoryBackend::new();
        backend.add_account("a@b.com", "secret1");
        let outcome = submit(&backend, AuthMode::SignIn, "a@b.com", "secret1")
            .await
            .unwrap();
        match outcome {
            AuthOutcome::SignedIn(session) => assert_eq!(session.email(), Some("a@b.com")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_mode_toggle_labels() {
        let mode = AuthMode::default();
        assert_eq!(mode.title(), "Sign In");
        assert_eq!(mode.toggled().title(), "Create an Account");
        assert_eq!(mode.toggled().toggled(), AuthMode::SignIn);
    }
}
