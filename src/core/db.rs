//! Database connection helpers for the persisted message store.

use anyhow::Result;
use rusqlite::Connection as SyncConnection;
use tokio_rusqlite::Connection;

/// Open an async connection to the sqlite database at `db_path`.
pub async fn async_db(db_path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    Connection::open(db_path.to_owned()).await
}

/// Create the session and message tables if they don't already
/// exist. Safe to call on every startup.
pub fn initialize_db(conn: &SyncConnection, message_table: &str) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS session (
            id TEXT PRIMARY KEY,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_{table}_session_id ON {table} (session_id);
        "#,
        table = message_table
    ))?;
    Ok(())
}
