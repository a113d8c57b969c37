//! Wire models of the hosted backend's auth responses.

mod token;

pub use token::{SignUpResponse, TokenResponse};
