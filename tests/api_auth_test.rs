//! Integration tests for the auth gate endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use tower::util::ServiceExt;

    use crate::test_utils::{authenticated_app, body_to_string, test_app, test_app_with_state, test_config};

    /// Tests that login redirects to the provider with a PKCE challenge
    #[tokio::test]
    async fn it_redirects_login_to_the_provider() {
        let app = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

        let location = response
            .headers()
            .get("location")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(location.starts_with("https://provider.test/authorize?"));
        assert!(location.contains("code_challenge="));
        assert!(location.contains("code_challenge_method=S256"));
        assert!(location.contains("scope=openid%20email%20profile"));
    }

    /// Tests that a callback with an unknown state is rejected
    #[tokio::test]
    async fn it_rejects_callback_with_unknown_state() {
        let app = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/callback?code=abc&state=never-issued")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    /// Tests that identity is hidden until the gate has passed
    #[tokio::test]
    async fn it_returns_401_for_me_before_login() {
        let app = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    /// Tests the full login round trip: login, provider callback,
    /// token exchange, identity, greeting
    #[tokio::test]
    async fn it_completes_the_flow_and_greets_first_visit() {
        let mut server = mockito::Server::new_async().await;

        let claims = r#"{"email":"a@example.com","name":"Test User"}"#;
        let id_token = format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(claims)
        );
        let _mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"access_token":"at-1","id_token":"{}","token_type":"Bearer"}}"#,
                id_token
            ))
            .create_async()
            .await;

        let mut config = test_config();
        config.token_endpoint = format!("{}/token", server.url());
        let (app, _state) = test_app_with_state(config).await;

        // Begin the flow to get a state nonce to round trip
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let location = response
            .headers()
            .get("location")
            .unwrap()
            .to_str()
            .unwrap();
        let state_nonce = location
            .split('&')
            .find_map(|kv| kv.strip_prefix("state="))
            .unwrap()
            .to_string();

        // Complete the flow via the provider's redirect
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/auth/callback?code=auth-code&state={}", state_nonce))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("\"email\":\"a@example.com\""));
        assert!(body.contains("\"session_id\":\"140fcc60-1f57-57d1-9374-6571563ed10e\""));

        // First-ever visit gets exactly one greeting in the transcript
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/chat")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("Hello! How can I assist you today?"));
    }

    /// Tests that login after authentication redirects to the identity
    #[tokio::test]
    async fn it_short_circuits_login_once_authenticated() {
        let (app, _state) = authenticated_app(test_config()).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response
            .headers()
            .get("location")
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(location, "/api/auth/me");
    }

    /// Tests the identity summary after login
    #[tokio::test]
    async fn it_returns_identity_after_login() {
        let (app, _state) = authenticated_app(test_config()).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains("\"email\":\"a@example.com\""));
        assert!(body.contains("\"display_name\":\"Test User\""));
    }
}
