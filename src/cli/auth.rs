use anyhow::Result;
use std::io::{self, Write};

use crate::auth::AuthGate;
use crate::auth::oauth::{authorize_url, exchange_code_for_token, generate_pkce};
use crate::auth::token::verify_id_token;
use crate::core::AppConfig;
use crate::session::SessionStore;

/// Walk through the authorization flow interactively: present the
/// provider URL, wait for the pasted code, exchange it, and populate
/// a session store. The single human-in-the-loop suspension point in
/// the whole system.
pub async fn interactive_login(config: &AppConfig) -> Result<(SessionStore, String)> {
    let pkce = generate_pkce();
    // The code is pasted back by hand so the redirect state nonce
    // has nothing to round-trip through
    let url = authorize_url(config, &pkce.challenge, "cli");

    println!(
        "\nPlease open the following URL in your browser and authorize access:\n\n{}\n",
        url
    );
    print!("Paste the authorization code shown by the provider here: ");
    io::stdout().flush()?;
    let mut code = String::new();
    io::stdin().read_line(&mut code)?;
    let code = code.trim();

    let token = exchange_code_for_token(config, code, &pkce.verifier).await?;

    if let (Some(jwks_url), Some(id_token)) = (&config.jwks_url, token.id_token.as_deref()) {
        verify_id_token(id_token, jwks_url, &config.client_id).await?;
    }

    let mut gate = AuthGate::new();
    let mut store = SessionStore::new();
    let session_id = gate.complete_flow(&mut store, token)?;

    Ok((store, session_id))
}

pub async fn run() -> Result<()> {
    let config = AppConfig::default();
    let (store, session_id) = interactive_login(&config).await?;

    let identity = store
        .identity()
        .expect("Login completed without an identity");
    println!(
        "\nWelcome, {} ({})!\nSession: {}",
        identity.display_name, identity.email, session_id
    );

    Ok(())
}
