use tokio_rusqlite::Connection;

use crate::auth::AuthGate;
use crate::core::AppConfig;
use crate::session::SessionStore;

pub struct AppState {
    pub db: Connection,
    pub config: AppConfig,
    pub gate: AuthGate,
    pub session: SessionStore,
}

impl AppState {
    pub fn new(db: Connection, config: AppConfig) -> Self {
        Self {
            db,
            config,
            gate: AuthGate::new(),
            session: SessionStore::new(),
        }
    }
}
