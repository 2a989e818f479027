mod support;

use std::sync::Arc;

use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::json;
use spotme::{
    error::{AuthError, TokenError},
    logging::NullLogger,
    spotify::TokenClient,
    types::AuthConfig,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header, method, path},
};

fn config_for(token_endpoint: String) -> AuthConfig {
    let mut config = AuthConfig::new(
        "client-123",
        "127.0.0.1:6969",
        "https://accounts.example.test/authorize",
        "",
    );
    config.token_endpoint = token_endpoint;
    config
}

fn client() -> TokenClient {
    TokenClient::new(Arc::new(NullLogger))
}

#[tokio::test]
async fn test_exchange_code_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("client_id=client-123"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=ABC"))
        .and(body_string_contains(
            "redirect_uri=http%3A%2F%2F127.0.0.1%3A6969%2Fcallback",
        ))
        .and(body_string_contains("code_verifier=verifier123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT1",
            "refresh_token": "RT1",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let before = Utc::now().timestamp();
    let tokens = client()
        .exchange_code(
            &config_for(format!("{}/api/token", server.uri())),
            "ABC",
            "verifier123",
        )
        .await
        .unwrap();
    let after = Utc::now().timestamp();

    assert_eq!(tokens.access_token, "AT1");
    assert_eq!(tokens.refresh_token.as_deref(), Some("RT1"));
    let expires_at = tokens.expires_at.timestamp();
    assert!(expires_at >= before + 3600 && expires_at <= after + 3601);
}

#[tokio::test]
async fn test_exchange_code_non_200_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
        .mount(&server)
        .await;

    let err = client()
        .exchange_code(&config_for(server.uri()), "ABC", "verifier123")
        .await
        .unwrap_err();

    match err {
        TokenError::Status { status, body } => {
            assert_eq!(status.as_u16(), 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_exchange_code_requires_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT1",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let err = client()
        .exchange_code(&config_for(server.uri()), "ABC", "verifier123")
        .await
        .unwrap_err();

    assert!(matches!(err, TokenError::Malformed(_)));
}

#[tokio::test]
async fn test_exchange_code_rejects_non_integer_lifetime() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT1",
            "refresh_token": "RT1",
            "expires_in": "soon"
        })))
        .mount(&server)
        .await;

    let err = client()
        .exchange_code(&config_for(server.uri()), "ABC", "verifier123")
        .await
        .unwrap_err();

    assert!(matches!(
        AuthError::exchange(err),
        AuthError::Exchange(TokenError::Malformed(_))
    ));
}

#[tokio::test]
async fn test_refresh_keeps_refresh_token_when_not_rotated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("client_id=client-123"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=RT1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT2",
            "expires_in": 1800
        })))
        .expect(1)
        .mount(&server)
        .await;

    let before = Utc::now().timestamp();
    let tokens = client()
        .refresh_token(&config_for(format!("{}/api/token", server.uri())), "RT1")
        .await
        .unwrap();
    let after = Utc::now().timestamp();

    assert_eq!(tokens.access_token, "AT2");
    assert_eq!(tokens.refresh_token.as_deref(), Some("RT1"));
    let expires_at = tokens.expires_at.timestamp();
    assert!(expires_at >= before + 1800 && expires_at <= after + 1801);
}

#[tokio::test]
async fn test_refresh_uses_rotated_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT2",
            "refresh_token": "RT2",
            "expires_in": 1800
        })))
        .mount(&server)
        .await;

    let tokens = client()
        .refresh_token(&config_for(server.uri()), "RT1")
        .await
        .unwrap();

    assert_eq!(tokens.refresh_token.as_deref(), Some("RT2"));
}

#[tokio::test]
async fn test_refresh_failure_is_a_refresh_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("revoked"))
        .mount(&server)
        .await;

    let err = client()
        .refresh_token(&config_for(server.uri()), "RT1")
        .await
        .unwrap_err();

    assert!(matches!(
        AuthError::refresh(err),
        AuthError::Refresh(TokenError::Status { .. })
    ));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_network_error() {
    let addr = support::free_addr();

    let err = client()
        .refresh_token(&config_for(format!("http://{addr}/api/token")), "RT1")
        .await
        .unwrap_err();

    assert!(matches!(err, TokenError::Transport(_)));
    assert!(matches!(AuthError::refresh(err), AuthError::Network(_)));
}
