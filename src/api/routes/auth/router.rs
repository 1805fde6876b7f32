//! Router for the auth gate. Until the flow completes, every other
//! surface answers 401; once it succeeds it is terminal for the
//! visit.

use std::sync::{Arc, RwLock};

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tokio::sync::Mutex;

use super::public;
use crate::api::state::AppState;
use crate::auth::oauth::exchange_code_for_token;
use crate::auth::token::verify_id_token;
use crate::chat::Conversation;

type SharedState = Arc<RwLock<AppState>>;

/// Begin the authorization flow by redirecting to the identity
/// provider with a fresh PKCE challenge.
async fn login(State(state): State<SharedState>) -> Response {
    let s = &mut *state.write().expect("Unable to write shared state");
    if s.session.is_authenticated() {
        return Redirect::temporary("/api/auth/me").into_response();
    }

    let url = s.gate.begin_flow(&s.config);
    Redirect::temporary(&url).into_response()
}

/// Complete the flow with the provider's redirect: exchange the code,
/// decode the identity token, and populate the session.
async fn callback(
    State(state): State<SharedState>,
    Query(params): Query<public::AuthCallbackQuery>,
) -> Response {
    let (pending, config) = {
        let s = &mut *state.write().expect("Unable to write shared state");
        (s.gate.take_pending(&params.state), s.config.clone())
    };
    let Some(pending) = pending else {
        return (
            StatusCode::UNAUTHORIZED,
            "Unknown or expired login attempt".to_string(),
        )
            .into_response();
    };

    let token = match exchange_code_for_token(&config, &params.code, &pending.verifier).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Token exchange failed: {}", e);
            return (StatusCode::UNAUTHORIZED, format!("Login failed: {}", e)).into_response();
        }
    };

    // Check the token signature against the provider's published
    // keys when configured. Without a JWKS URL the claims are
    // trusted as-is.
    if let (Some(jwks_url), Some(id_token)) = (&config.jwks_url, token.id_token.as_deref()) {
        if let Err(e) = verify_id_token(id_token, jwks_url, &config.client_id).await {
            tracing::error!("Identity token rejected: {}", e);
            return (StatusCode::UNAUTHORIZED, format!("Login failed: {}", e)).into_response();
        }
    }

    let (session_id, db, needs_conversation) = {
        let s = &mut *state.write().expect("Unable to write shared state");
        let session_id = match s.gate.complete_flow(&mut s.session, token) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Completing auth flow failed: {}", e);
                return (StatusCode::UNAUTHORIZED, format!("Login failed: {}", e))
                    .into_response();
            }
        };
        (session_id, s.db.clone(), s.session.conversation().is_none())
    };

    // Load the persisted transcript for this identity, greeting
    // first-ever visitors
    if needs_conversation {
        let mut conversation = Conversation::new(db, &config.message_table, &session_id);
        if let Err(e) = conversation.initialize().await {
            return crate::api::public::ApiError::from(e).into_response();
        }
        let s = &mut *state.write().expect("Unable to write shared state");
        s.session.set_conversation(Arc::new(Mutex::new(conversation)));
    }

    whoami(&state)
}

/// The authenticated identity, or 401 before the gate has passed.
async fn me(State(state): State<SharedState>) -> Response {
    whoami(&state)
}

fn whoami(state: &SharedState) -> Response {
    let s = state.read().expect("Unable to read shared state");
    match (s.session.identity(), s.session.session_id()) {
        (Some(identity), Some(session_id)) => axum::Json(public::WhoamiResponse {
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            session_id: session_id.to_string(),
        })
        .into_response(),
        _ => (StatusCode::UNAUTHORIZED, "Not authenticated".to_string()).into_response(),
    }
}

/// Create the auth router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/me", get(me))
}
