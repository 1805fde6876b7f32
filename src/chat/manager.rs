//! Drives one conversation: persists each turn, builds the prompt
//! from the transcript, and relays the streamed reply.

use anyhow::{Error, Result, bail};
use tokio::sync::mpsc;
use tokio_rusqlite::Connection;

use crate::chat::db::{find_transcript, get_or_create_session, insert_chat_message};
use crate::chat::prompt::render_chat_prompt;
use crate::chat::{Message, Role, Transcript};
use crate::openai::{CompletionError, completion_stream};

pub const GREETING: &str = "Hello! How can I assist you today?";

/// A single session's conversation. The in-memory transcript is a
/// prefix-consistent mirror of the persisted rows: every append goes
/// to the database first, then the cache, in the same order.
pub struct Conversation {
    db: Connection,
    table: String,
    session_id: String,
    cache: Transcript,
}

impl Conversation {
    pub fn new(db: Connection, table: &str, session_id: &str) -> Self {
        Self {
            db,
            table: table.to_string(),
            session_id: session_id.to_string(),
            cache: Transcript::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The current in-memory transcript.
    pub fn transcript(&self) -> Vec<Message> {
        self.cache.messages()
    }

    /// Load the persisted transcript into the cache. On the first
    /// ever visit for this session the persisted transcript is empty
    /// and a greeting is appended instead. Idempotent: only acts when
    /// the cache is empty.
    pub async fn initialize(&mut self) -> Result<(), Error> {
        if !self.cache.is_empty() {
            return Ok(());
        }

        let persisted = find_transcript(&self.db, &self.table, &self.session_id).await?;
        if persisted.is_empty() {
            get_or_create_session(&self.db, &self.session_id).await?;
            let greeting = Message::new(Role::Assistant, GREETING);
            insert_chat_message(&self.db, &self.table, &self.session_id, &greeting).await?;
            self.cache.push(greeting);
        } else {
            self.cache = Transcript::new_with_messages(persisted);
        }

        Ok(())
    }

    /// Run the next turn: persist the user's message, stream the
    /// reply through `tx`, then persist the reply. If the stream
    /// fails partway, the fragments received so far are persisted as
    /// an assistant message tagged incomplete rather than dropped.
    pub async fn submit_turn(
        &mut self,
        user_text: &str,
        tx: mpsc::UnboundedSender<String>,
        api_hostname: &str,
        api_key: &str,
        model: &str,
    ) -> Result<Message, Error> {
        if user_text.trim().is_empty() {
            bail!("Cannot submit an empty message");
        }

        // The persisted write is authoritative. A store failure here
        // aborts the turn before anything was sent upstream.
        get_or_create_session(&self.db, &self.session_id).await?;
        let user_msg = Message::new(Role::User, user_text);
        insert_chat_message(&self.db, &self.table, &self.session_id, &user_msg).await?;
        self.cache.push(user_msg);

        let prompt = render_chat_prompt(&self.cache, user_text)?;
        let request = vec![Message::new(Role::User, &prompt)];

        match completion_stream(tx, &request, api_hostname, api_key, model).await {
            Ok(reply) => {
                let assistant_msg = Message::new(Role::Assistant, &reply);
                insert_chat_message(&self.db, &self.table, &self.session_id, &assistant_msg)
                    .await?;
                self.cache.push(assistant_msg.clone());
                Ok(assistant_msg)
            }
            Err(CompletionError::Interrupted { partial, source }) => {
                if !partial.is_empty() {
                    let partial_msg = Message::new_incomplete(&partial);
                    insert_chat_message(&self.db, &self.table, &self.session_id, &partial_msg)
                        .await?;
                    self.cache.push(partial_msg);
                }
                Err(CompletionError::Interrupted { partial, source }.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}
