//! API routes module

pub mod auth;
pub mod chat;

use std::sync::{Arc, RwLock};

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<RwLock<AppState>>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Auth gate routes
        .nest("/auth", auth::router())
        // Chat routes
        .nest("/chat", chat::router())
}
