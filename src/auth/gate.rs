//! The auth gate: everything else in the system is short-circuited
//! until it has populated the session store with a verified identity.

use uuid::Uuid;

use crate::auth::oauth::{self, TokenResponse, generate_pkce};
use crate::auth::{AuthError, token};
use crate::core::AppConfig;
use crate::session::{Identity, SessionStore};

/// Derive the stable session identifier for an email. Same email,
/// same identifier, across process restarts: this is what makes
/// conversation history resumable and it is the foreign key for all
/// persisted message rows.
pub fn derive_session_id(email: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, email.as_bytes()).to_string()
}

/// A begun but not yet completed authorization flow.
#[derive(Clone, Debug)]
pub struct PendingFlow {
    pub verifier: String,
    pub state: String,
}

/// Two states: unauthenticated (optionally with a pending flow) and,
/// once `complete_flow` succeeds, authenticated for the rest of the
/// visit. The authenticated state lives in the session store.
#[derive(Default)]
pub struct AuthGate {
    pending: Option<PendingFlow>,
}

impl AuthGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the authorization request URL and retain the PKCE
    /// verifier and state nonce until the provider redirects back.
    pub fn begin_flow(&mut self, config: &AppConfig) -> String {
        let pkce = generate_pkce();
        let state = Uuid::new_v4().to_string();
        let url = oauth::authorize_url(config, &pkce.challenge, &state);
        self.pending = Some(PendingFlow {
            verifier: pkce.verifier,
            state,
        });
        url
    }

    /// Consume the pending flow if `state` matches the nonce from
    /// `begin_flow`. A mismatch leaves nothing to resume.
    pub fn take_pending(&mut self, state: &str) -> Option<PendingFlow> {
        match &self.pending {
            Some(pending) if pending.state == state => self.pending.take(),
            _ => None,
        }
    }

    /// Given the token exchange result, extract and decode the
    /// identity token, derive the session identifier from the
    /// verified email, and populate the session store. Terminal: once
    /// the store is authenticated this is a no-op returning the
    /// existing session id.
    pub fn complete_flow(
        &mut self,
        store: &mut SessionStore,
        token_response: TokenResponse,
    ) -> Result<String, AuthError> {
        if let Some(session_id) = store.session_id() {
            return Ok(session_id.to_string());
        }

        let id_token = token_response
            .id_token
            .as_deref()
            .ok_or_else(|| AuthError::MalformedToken("no id_token in response".to_string()))?;
        let claims = token::decode_claims(id_token)?;

        let session_id = derive_session_id(&claims.email);
        let identity = Identity {
            email: claims.email,
            display_name: claims.name,
            raw_token: token_response,
        };
        store.authenticate(identity, &session_id);
        self.pending = None;

        Ok(session_id)
    }
}
