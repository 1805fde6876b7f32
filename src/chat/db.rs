//! Append/read operations against the persisted message store.
use anyhow::{Error, Result};
use serde_json::json;
use tokio_rusqlite::Connection;

use crate::chat::Message;

/// Insert a new session record if it doesn't already exist.
///
/// NOTE: While it isn't great that this gets called repeatedly for
/// each turn in the chat, it avoids filling up the DB with sessions
/// that have no messages e.g. a login that never submitted a turn.
pub async fn get_or_create_session(db: &Connection, session_id: &str) -> Result<(), Error> {
    let session_id_owned = session_id.to_owned();
    db.call(move |conn| {
        conn.execute(
            "INSERT OR IGNORE INTO session (id) VALUES (?)",
            [&session_id_owned],
        )?;
        Ok(())
    })
    .await?;

    Ok(())
}

pub async fn insert_chat_message(
    db: &Connection,
    table: &str,
    session_id: &str,
    msg: &Message,
) -> Result<usize, Error> {
    let s_id = session_id.to_owned();
    let data = json!(msg).to_string();
    let query = format!("INSERT INTO {} (session_id, data) VALUES (?, ?)", table);
    let result = db
        .call(move |conn| {
            let mut stmt = conn.prepare(&query)?;
            let result = stmt.execute([s_id, data])?;
            Ok(result)
        })
        .await?;

    Ok(result)
}

/// Read back the full transcript for a session in insertion order.
pub async fn find_transcript(
    db: &Connection,
    table: &str,
    session_id: &str,
) -> Result<Vec<Message>, Error> {
    let s_id = session_id.to_owned();
    let query = format!(
        "SELECT data FROM {} WHERE session_id=? ORDER BY id ASC",
        table
    );
    let history = db.call(move |conn| {
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map([s_id], |i| {
                let val: String = i.get(0)?;
                let msg: Message = serde_json::from_str(&val).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(msg)
            })?
            .filter_map(Result::ok)
            .collect::<Vec<Message>>();
        Ok(rows)
    });
    Ok(history.await?)
}
