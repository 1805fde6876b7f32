//! The completion prompt using Handlebars for templating. Handlebars
//! adds additional security controls since it can't do much out of
//! the box without registering your own helpers, which is ideal since
//! transcript content should be considered untrusted.

use anyhow::{Error, Result};
use handlebars::Handlebars;
use serde_json::json;

use crate::chat::Transcript;

const CHAT_TURN_PROMPT: &str = r"You are a helpful assistant. Answer considering chat history.

Chat History: {{chat_history}}
User Question: {{user_question}}

Provide a clear, concise response.";

const CHAT_TURN: &str = "ChatTurn";

fn templates<'a>() -> Handlebars<'a> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry
        .register_template_string(CHAT_TURN, CHAT_TURN_PROMPT)
        .expect("Failed to register template");
    registry
}

/// Render the fixed chat prompt, substituting the full current
/// transcript and the user's question.
pub fn render_chat_prompt(transcript: &Transcript, user_question: &str) -> Result<String, Error> {
    let chat_history = transcript
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<String>>()
        .join("\n");

    let rendered = templates().render(
        CHAT_TURN,
        &json!({
            "chat_history": chat_history,
            "user_question": user_question,
        }),
    )?;
    Ok(rendered)
}
