//! Test utilities for integration tests
use std::sync::{Arc, RwLock};

use axum::{Router, body::Body};
use tokio::sync::Mutex;

use parley::api::AppState;
use parley::api::app;
use parley::auth::derive_session_id;
use parley::auth::oauth::TokenResponse;
use parley::chat::Conversation;
use parley::core::AppConfig;
use parley::core::db::{async_db, initialize_db};
use parley::session::Identity;

/// A config pointing at endpoints that only exist in tests. Callers
/// override the endpoints they actually exercise with a mock server.
pub fn test_config() -> AppConfig {
    AppConfig {
        db_path: String::from(":memory:"),
        message_table: String::from("message_store"),
        client_id: String::from("test-client-id"),
        client_secret: String::from("test-client-secret"),
        authorize_endpoint: String::from("https://provider.test/authorize"),
        token_endpoint: String::from("https://provider.test/token"),
        revoke_endpoint: String::from("https://provider.test/revoke"),
        redirect_uri: String::from("http://localhost:2222/api/auth/callback"),
        jwks_url: None,
        openai_api_hostname: String::from("https://api.openai.com"),
        openai_api_key: String::from("test-api-key"),
        openai_model: String::from("gpt-4o"),
    }
}

/// Creates a test application router backed by a scratch database.
pub async fn test_app_with_state(config: AppConfig) -> (Router, Arc<RwLock<AppState>>) {
    // A file-backed db so every clone of the connection sees the
    // same data
    let db_file = tempfile::Builder::new()
        .prefix("parley-test-")
        .suffix(".sqlite3")
        .tempfile()
        .expect("Failed to create temp db file");
    let db_path = db_file
        .into_temp_path()
        .keep()
        .expect("Failed to persist temp db file");

    let mut config = config;
    config.db_path = db_path.display().to_string();

    let db = async_db(&config.db_path)
        .await
        .expect("Failed to connect to async db");
    let message_table = config.message_table.clone();
    db.call(move |conn| {
        initialize_db(conn, &message_table).expect("Failed to migrate db");
        Ok(())
    })
    .await
    .unwrap();

    let app_state = AppState::new(db, config);
    let shared_state = Arc::new(RwLock::new(app_state));
    (app(Arc::clone(&shared_state)), shared_state)
}

pub async fn test_app() -> Router {
    test_app_with_state(test_config()).await.0
}

/// An app with the gate already passed for `a@example.com`, with the
/// conversation initialized (greeting persisted).
pub async fn authenticated_app(config: AppConfig) -> (Router, Arc<RwLock<AppState>>) {
    let (app, state) = test_app_with_state(config).await;

    let (db, table) = {
        let s = state.read().unwrap();
        (s.db.clone(), s.config.message_table.clone())
    };
    let session_id = derive_session_id("a@example.com");
    let mut conversation = Conversation::new(db, &table, &session_id);
    conversation.initialize().await.unwrap();

    {
        let s = &mut *state.write().unwrap();
        let identity = Identity {
            email: String::from("a@example.com"),
            display_name: String::from("Test User"),
            raw_token: TokenResponse {
                access_token: String::from("at-1"),
                id_token: None,
                refresh_token: None,
                expires_in: None,
                token_type: None,
                scope: None,
            },
        };
        s.session.authenticate(identity, &session_id);
        s.session
            .set_conversation(Arc::new(Mutex::new(conversation)));
    }

    (app, state)
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
