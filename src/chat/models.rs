//! The core models for managing a stateful chat transcript.
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// A single conversation turn. The role is an explicit tag so the
/// display surface never has to inspect the message to pick one.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    // Set on an assistant message persisted after the completion
    // stream failed partway through.
    #[serde(default, skip_serializing_if = "is_false")]
    pub incomplete: bool,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
            incomplete: false,
        }
    }

    pub fn new_incomplete(content: &str) -> Self {
        Message {
            role: Role::Assistant,
            content: content.to_string(),
            incomplete: true,
        }
    }
}

/// The ordered sequence of messages for one session. When backed by
/// the database this is a read-through projection of the persisted
/// rows, in insertion order.
#[derive(Default)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn new_with_messages(messages: Vec<Message>) -> Self {
        Self(messages)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.0.clone()
    }

    pub fn push(&mut self, msg: Message) {
        self.0.push(msg)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.0.iter()
    }
}
