//! Public types for the chat API
use serde::{Deserialize, Serialize};

use crate::chat::Message;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatTranscriptResponse {
    pub transcript: Vec<Message>,
}
