use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write as _;
use tokio::sync::mpsc;

use crate::chat::Conversation;
use crate::cli::auth::interactive_login;
use crate::core::AppConfig;
use crate::core::db::{async_db, initialize_db};

pub async fn run() -> Result<()> {
    let config = AppConfig::default();

    let db = async_db(&config.db_path)
        .await
        .expect("Failed to connect to db");
    let message_table = config.message_table.clone();
    db.call(move |conn| {
        initialize_db(conn, &message_table).expect("DB initialization failed");
        Ok(())
    })
    .await?;

    // Nothing proceeds until the gate passes
    let (store, session_id) = interactive_login(&config).await?;
    let identity = store
        .identity()
        .expect("Login completed without an identity");
    println!(
        "\nWelcome, {} ({})!\n",
        identity.display_name, identity.email
    );

    let mut conversation = Conversation::new(db, &config.message_table, &session_id);
    conversation.initialize().await?;

    // Replay the transcript from previous visits
    for msg in conversation.transcript() {
        println!("{}: {}", msg.role.as_str(), msg.content);
    }

    let mut rl = DefaultEditor::new().expect("Editor failed");

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }

                let (tx, mut rx) = mpsc::unbounded_channel::<String>();
                // Print fragments as they arrive
                let printer = tokio::spawn(async move {
                    while let Some(fragment) = rx.recv().await {
                        print!("{}", fragment);
                        let _ = std::io::stdout().flush();
                    }
                });

                let result = conversation
                    .submit_turn(
                        &line,
                        tx,
                        &config.openai_api_hostname,
                        &config.openai_api_key,
                        &config.openai_model,
                    )
                    .await;
                let _ = printer.await;
                println!();

                if let Err(err) = result {
                    println!("Error: {:?}", err);
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
