//! Per-visit session state: the authenticated identity, the derived
//! session identifier, and the active conversation. Lifetime is one
//! user visit; everything here resets on process restart and nothing
//! in it is ever persisted.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::auth::oauth::TokenResponse;
use crate::chat::Conversation;

/// Who is logged in. Created once per successful auth flow and
/// immutable for the rest of the visit.
#[derive(Clone, Debug)]
pub struct Identity {
    pub email: String,
    pub display_name: String,
    // Held opaquely; never inspected after login
    pub raw_token: TokenResponse,
}

/// Plain state holder with existence-guarded accessors. Passed
/// explicitly to the handlers that need it rather than living in any
/// ambient global.
#[derive(Default)]
pub struct SessionStore {
    identity: Option<Identity>,
    session_id: Option<String>,
    conversation: Option<Arc<Mutex<Conversation>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Record a successful login. Only the first call for a visit
    /// takes effect; the gate is terminal once it succeeds.
    pub fn authenticate(&mut self, identity: Identity, session_id: &str) {
        if self.identity.is_none() {
            self.identity = Some(identity);
            self.session_id = Some(session_id.to_string());
        }
    }

    pub fn conversation(&self) -> Option<Arc<Mutex<Conversation>>> {
        self.conversation.clone()
    }

    /// Attach the conversation for this visit. Only initializes when
    /// currently absent.
    pub fn set_conversation(&mut self, conversation: Arc<Mutex<Conversation>>) {
        if self.conversation.is_none() {
            self.conversation = Some(conversation);
        }
    }
}
