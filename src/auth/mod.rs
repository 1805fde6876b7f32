mod gate;
pub mod oauth;
pub mod token;

pub use gate::{AuthGate, PendingFlow, derive_session_id};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token exchange with the identity provider failed: {0}")]
    Exchange(#[source] anyhow::Error),
    #[error("identity token is malformed: {0}")]
    MalformedToken(String),
    #[error("identity token is missing required claim: {0}")]
    MissingClaim(&'static str),
    #[error("identity token signature verification failed: {0}")]
    InvalidSignature(#[source] anyhow::Error),
}
