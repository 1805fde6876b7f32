use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: String,
    pub message_table: String,
    pub client_id: String,
    pub client_secret: String,
    pub authorize_endpoint: String,
    pub token_endpoint: String,
    pub revoke_endpoint: String,
    pub redirect_uri: String,
    // When unset, identity token claims are trusted without checking
    // the signature against the provider's published keys.
    pub jwks_url: Option<String>,
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    pub openai_model: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let db_path =
            env::var("PARLEY_DATABASE_PATH").expect("Missing env var PARLEY_DATABASE_PATH");
        let message_table =
            env::var("PARLEY_MESSAGE_TABLE").unwrap_or_else(|_| "message_store".to_string());
        let client_id = env::var("PARLEY_CLIENT_ID").expect("Missing env var PARLEY_CLIENT_ID");
        let client_secret =
            env::var("PARLEY_CLIENT_SECRET").expect("Missing env var PARLEY_CLIENT_SECRET");
        let authorize_endpoint = env::var("PARLEY_AUTHORIZE_ENDPOINT")
            .expect("Missing env var PARLEY_AUTHORIZE_ENDPOINT");
        let token_endpoint =
            env::var("PARLEY_TOKEN_ENDPOINT").expect("Missing env var PARLEY_TOKEN_ENDPOINT");
        let revoke_endpoint =
            env::var("PARLEY_REVOKE_ENDPOINT").expect("Missing env var PARLEY_REVOKE_ENDPOINT");
        let redirect_uri =
            env::var("PARLEY_REDIRECT_URI").expect("Missing env var PARLEY_REDIRECT_URI");
        let jwks_url = env::var("PARLEY_JWKS_URL").ok().filter(|s| !s.is_empty());
        let openai_api_hostname = env::var("PARLEY_LLM_HOST")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let openai_api_key =
            env::var("OPENAI_API_KEY").unwrap_or_else(|_| "thiswontworkforopenai".to_string());
        let openai_model = env::var("PARLEY_LLM_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        Self {
            db_path,
            message_table,
            client_id,
            client_secret,
            authorize_endpoint,
            token_endpoint,
            revoke_endpoint,
            redirect_uri,
            jwks_url,
            openai_api_hostname,
            openai_api_key,
            openai_model,
        }
    }
}
