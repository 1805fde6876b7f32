pub mod db;
mod manager;
mod models;
pub mod prompt;

pub use manager::{Conversation, GREETING};
pub use models::{Message, Role, Transcript};
