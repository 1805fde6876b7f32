use anyhow::{Result, anyhow};
use std::fs;
use std::path::Path;

use crate::core::AppConfig;
use crate::core::db::{async_db, initialize_db};

pub async fn run(db: bool) -> Result<()> {
    if !db {
        return Err(anyhow!("Missing value for init \"--db\""));
    }

    let config = AppConfig::default();

    println!("Initializing db...");
    if let Some(parent) = Path::new(&config.db_path).parent() {
        fs::create_dir_all(parent)
            .unwrap_or_else(|err| println!("Ignoring db directory create failed: {}", err));
    }

    let db = async_db(&config.db_path)
        .await
        .expect("Failed to connect to db");
    let message_table = config.message_table.clone();
    db.call(move |conn| {
        initialize_db(conn, &message_table).expect("DB initialization failed");
        Ok(())
    })
    .await?;
    println!("Finished initializing db");

    Ok(())
}
