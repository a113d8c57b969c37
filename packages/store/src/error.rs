//! Error taxonomy shared by every task operation.
//!
//! Each variant carries the human-readable message reported by the collaborator
//! (or by local validation) so the UI can show it verbatim in a toast.

/// Failure of a task, auth, or storage operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Local, pre-network rejection of user input.
    #[error("{0}")]
    Validation(String),
    /// Sign-in, sign-up, sign-out, or session refresh failed.
    #[error("{0}")]
    Auth(String),
    /// Reading tasks or opening a change subscription failed.
    #[error("{0}")]
    Fetch(String),
    /// Uploading an image to object storage failed.
    #[error("{0}")]
    Upload(String),
    /// Insert, update, or delete failed.
    #[error("{0}")]
    Mutation(String),
}

impl Error {
    /// Short title used for notifications.
    pub fn title(&self) -> &'static str {
        match self {
            Error::Validation(_) => "Invalid input",
            Error::Auth(_) => "Authentication error",
            Error::Fetch(_) => "Failed to fetch tasks",
            Error::Upload(_) => "Image upload failed",
            Error::Mutation(_) => "Error",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
