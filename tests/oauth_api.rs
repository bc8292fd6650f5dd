//! OAuth helper tests: authorization URL, code exchange and refresh.

use nowapi::{Credentials, NowClient, NowError, OAuthClient, OAuthToken, DEFAULT_OAUTH_RELAY, DEFAULT_REDIRECT_URL};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "result": {
            "access_token": "a1",
            "refresh_token": "r1",
            "token_type": "Bearer",
            "expires_in": 1799,
            "scope": "useraccount"
        }
    }))
}

#[tokio::test]
async fn test_generate_exchanges_code() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(DEFAULT_OAUTH_RELAY))
        .and(body_json(json!({
            "grant_type": "authorization_code",
            "redirect_uri": DEFAULT_REDIRECT_URL,
            "client_id": "id",
            "client_secret": "secret",
            "code": "the-code"
        })))
        .respond_with(token_response())
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NowClient::new("/api/now/table", &mock_server.uri()).unwrap();
    let oauth = client.oauth();
    oauth.set_client_details(OAuthClient::new("id", "secret"));

    let token = oauth
        .generate("the-code", DEFAULT_REDIRECT_URL)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(token.access_token, "a1");
    assert_eq!(token.refresh_token, "r1");
    assert_eq!(token.expires_in, 1799);
    assert_eq!(token.scope.as_deref(), Some("useraccount"));

    // Issuing a token does not switch the client's credentials
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_refresh_sends_refresh_grant() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(DEFAULT_OAUTH_RELAY))
        .and(body_json(json!({
            "grant_type": "refresh_token",
            "redirect_uri": "myapp://callback",
            "client_id": "id",
            "client_secret": "secret",
            "refresh_token": "r0"
        })))
        .respond_with(token_response())
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NowClient::new("/api/now/table", &mock_server.uri()).unwrap();
    client.set_credentials(Credentials::oauth(
        OAuthClient::new("id", "secret"),
        OAuthToken::bearer("a0", "r0"),
    ));

    let token = client
        .oauth()
        .refresh("r0", "myapp://callback")
        .await
        .unwrap();

    assert_eq!(token.map(|t| t.access_token).as_deref(), Some("a1"));
}

#[tokio::test]
async fn test_rejected_grant_yields_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(DEFAULT_OAUTH_RELAY))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "invalid_grant"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NowClient::new("/api/now/table", &mock_server.uri()).unwrap();
    client
        .oauth()
        .set_client_details(OAuthClient::new("id", "secret"));

    let token = client
        .oauth()
        .generate("stale", DEFAULT_REDIRECT_URL)
        .await
        .unwrap();
    assert!(token.is_none());
}

#[tokio::test]
async fn test_custom_token_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth_token.do"))
        .respond_with(token_response())
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NowClient::new("/api/now/table", &mock_server.uri()).unwrap();
    client.set_oauth_token_path("/oauth_token.do");
    client
        .oauth()
        .set_client_details(OAuthClient::new("id", "secret"));

    let token = client
        .oauth()
        .generate("code", DEFAULT_REDIRECT_URL)
        .await
        .unwrap();
    assert!(token.is_some());
}

#[tokio::test]
async fn test_refresh_requires_client_details() {
    let client = NowClient::new("/api/now/table", "https://dev1.service-now.com").unwrap();
    client.set_credentials(Credentials::basic("admin", "pw"));

    let result = client.oauth().refresh("r0", DEFAULT_REDIRECT_URL).await;
    assert!(matches!(result, Err(NowError::NoClientDetails)));
}

#[test]
fn test_basic_credentials_keep_client_details() {
    let client = NowClient::new("/api/now/table", "https://dev1.service-now.com").unwrap();
    client.set_credentials(Credentials::oauth(
        OAuthClient::new("id", "secret"),
        OAuthToken::bearer("a0", "r0"),
    ));
    client.set_credentials(Credentials::basic("admin", "pw"));

    let url = client.oauth().authorize().unwrap();
    assert!(url.starts_with("https://dev1.service-now.com/oauth_auth.do?client_id=id"));
}
