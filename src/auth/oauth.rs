//! OAuth2 authorization-code flow with PKCE (S256) against an
//! externally configured identity provider.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::auth::AuthError;
use crate::core::AppConfig;

pub const SCOPES: &str = "openid email profile";

/// The PKCE verifier/challenge pair binding the authorization code
/// to this client.
#[derive(Clone, Debug)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

pub fn generate_pkce() -> PkcePair {
    let verifier: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    let challenge = challenge_for(&verifier);
    PkcePair { verifier, challenge }
}

/// S256: base64url(sha256(verifier)) without padding.
pub fn challenge_for(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Build the authorization request URL presented to the user.
pub fn authorize_url(config: &AppConfig, challenge: &str, state: &str) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&code_challenge={}&code_challenge_method=S256&access_type=offline&prompt=consent",
        config.authorize_endpoint,
        urlencoding::encode(&config.client_id),
        urlencoding::encode(&config.redirect_uri),
        urlencoding::encode(SCOPES),
        urlencoding::encode(state),
        urlencoding::encode(challenge),
    )
}

/// The provider's token endpoint response. Held opaquely on the
/// identity after login; only `id_token` is inspected.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub id_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Exchange the authorization code for tokens, proving possession of
/// the PKCE verifier.
pub async fn exchange_code_for_token(
    config: &AppConfig,
    code: &str,
    verifier: &str,
) -> Result<TokenResponse, AuthError> {
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", &config.client_id),
        ("client_secret", &config.client_secret),
        ("redirect_uri", &config.redirect_uri),
        ("code_verifier", verifier),
    ];

    let response = reqwest::Client::new()
        .post(&config.token_endpoint)
        .form(&params)
        .send()
        .await
        .map_err(|e| AuthError::Exchange(e.into()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Exchange(anyhow::anyhow!(
            "token endpoint returned {}: {}",
            status,
            body
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| AuthError::Exchange(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            db_path: ":memory:".into(),
            message_table: "message_store".into(),
            client_id: "client-123".into(),
            client_secret: "shhh".into(),
            authorize_endpoint: "https://provider.example.com/authorize".into(),
            token_endpoint: "https://provider.example.com/token".into(),
            revoke_endpoint: "https://provider.example.com/revoke".into(),
            redirect_uri: "http://localhost:2222/api/auth/callback".into(),
            jwks_url: None,
            openai_api_hostname: "https://api.openai.com".into(),
            openai_api_key: "test".into(),
            openai_model: "gpt-4o".into(),
        }
    }

    #[test]
    fn test_challenge_matches_rfc7636_vector() {
        // Appendix B of RFC 7636
        let challenge = challenge_for("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_generate_pkce_verifier_shape() {
        let pair = generate_pkce();
        assert_eq!(pair.verifier.len(), 64);
        assert!(pair.verifier.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(pair.challenge, challenge_for(&pair.verifier));
    }

    #[test]
    fn test_authorize_url_carries_pkce_and_scopes() {
        let url = authorize_url(&test_config(), "challenge-abc", "state-xyz");
        assert!(url.starts_with("https://provider.example.com/authorize?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("code_challenge=challenge-abc"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("state=state-xyz"));
    }

    #[tokio::test]
    async fn test_exchange_code_for_token() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"at-1","id_token":"a.b.c","refresh_token":"rt-1","expires_in":3600,"token_type":"Bearer"}"#,
            )
            .create_async()
            .await;

        let mut config = test_config();
        config.token_endpoint = format!("{}/token", server.url());

        let token = exchange_code_for_token(&config, "auth-code", "verifier")
            .await
            .unwrap();
        assert_eq!(token.access_token, "at-1");
        assert_eq!(token.id_token.as_deref(), Some("a.b.c"));
    }

    #[tokio::test]
    async fn test_exchange_failure_halts_flow() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let mut config = test_config();
        config.token_endpoint = format!("{}/token", server.url());

        let result = exchange_code_for_token(&config, "bad-code", "verifier").await;
        assert!(matches!(result, Err(AuthError::Exchange(_))));
    }
}
