//! Public types for the auth API
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct AuthCallbackQuery {
    pub code: String,
    pub state: String,
}

#[derive(Serialize)]
pub struct WhoamiResponse {
    pub email: String,
    pub display_name: String,
    pub session_id: String,
}
