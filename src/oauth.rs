//! OAuth helper.
//!
//! Builds the browser authorization URL and talks to the instance's token
//! relay for the initial code exchange and for refreshes. Token calls go out
//! through [`NowClient::send`] directly, so a 401 from the token endpoint is
//! never itself answered with another refresh.

use serde::Serialize;
use serde_with::skip_serializing_none;
use url::Url;

use crate::auth::{OAuthClient, OAuthToken};
use crate::client::NowClient;
use crate::error::{NowError, Result};
use crate::request::ApiRequest;

/// Token relay endpoint exposed by the scoped app.
pub const DEFAULT_OAUTH_RELAY: &str = "/api/x_flowm_mobile/fmm_oauth/oauth_relay";
/// Redirect URI registered for the mobile client.
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:8100/login";
/// Authorization page on the instance.
pub const AUTHORIZE_PATH: &str = "/oauth_auth.do";

/// OAuth grant sent to the token endpoint.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Grant<'a> {
    AuthorizationCode(&'a str),
    RefreshToken(&'a str),
}

impl Grant<'_> {
    fn grant_type(&self) -> &'static str {
        match self {
            Self::AuthorizationCode(_) => "authorization_code",
            Self::RefreshToken(_) => "refresh_token",
        }
    }
}

#[skip_serializing_none]
#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    redirect_uri: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    code: Option<&'a str>,
    refresh_token: Option<&'a str>,
}

/// OAuth operations against the instance a [`NowClient`] points at.
///
/// Obtained from [`NowClient::oauth`]. Client details live on the client, so
/// they persist across calls and are replaced whenever OAuth credentials are
/// set.
#[derive(Debug, Clone, Copy)]
pub struct OAuthApi<'a> {
    client: &'a NowClient,
}

impl<'a> OAuthApi<'a> {
    pub(crate) fn new(client: &'a NowClient) -> Self {
        Self { client }
    }

    /// Set the client id and secret used for authorization and tokens.
    pub fn set_client_details(&self, details: OAuthClient) {
        self.client
            .replace_auth_state(|state| state.with_oauth_client(details));
    }

    pub fn client_details(&self) -> Option<OAuthClient> {
        self.client.auth_state().oauth_client().cloned()
    }

    /// Random `state` value sent with the authorization request.
    pub fn state(&self) -> &'a str {
        self.client.oauth_state()
    }

    /// The URL a user opens to authorize this client.
    ///
    /// # Errors
    ///
    /// Returns [`NowError::NoClientDetails`] if no client details were set.
    pub fn authorize(&self) -> Result<String> {
        let details = self.client_details().ok_or(NowError::NoClientDetails)?;

        let url = Url::parse_with_params(
            &format!("{}{AUTHORIZE_PATH}", self.client.base_url()),
            [
                ("client_id", details.client_id.as_str()),
                ("client_secret", details.client_secret.as_str()),
                ("state", self.state()),
                ("grant_type", "authorization_code"),
                ("response_type", "code"),
            ],
        )?;

        Ok(url.into())
    }

    /// Exchange an authorization code for a token.
    ///
    /// Returns `None` if the token endpoint did not issue one.
    ///
    /// # Errors
    ///
    /// Returns [`NowError::NoClientDetails`] if no client details were set.
    pub async fn generate(&self, code: &str, redirect_uri: &str) -> Result<Option<OAuthToken>> {
        let details = self.client_details().ok_or(NowError::NoClientDetails)?;
        self.request_token(&details, Grant::AuthorizationCode(code), redirect_uri)
            .await
    }

    /// Exchange a refresh token for a new token.
    ///
    /// Returns `None` if the token endpoint did not issue one.
    ///
    /// # Errors
    ///
    /// Returns [`NowError::NoClientDetails`] if no client details were set.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        redirect_uri: &str,
    ) -> Result<Option<OAuthToken>> {
        let details = self.client_details().ok_or(NowError::NoClientDetails)?;
        self.request_token(&details, Grant::RefreshToken(refresh_token), redirect_uri)
            .await
    }

    #[tracing::instrument(skip(self, details, grant), fields(grant_type = grant.grant_type()))]
    pub(crate) async fn request_token(
        &self,
        details: &OAuthClient,
        grant: Grant<'_>,
        redirect_uri: &str,
    ) -> Result<Option<OAuthToken>> {
        let (code, refresh_token) = match grant {
            Grant::AuthorizationCode(code) => (Some(code), None),
            Grant::RefreshToken(token) => (None, Some(token)),
        };

        let body = TokenRequest {
            grant_type: grant.grant_type(),
            redirect_uri,
            client_id: &details.client_id,
            client_secret: &details.client_secret,
            code,
            refresh_token,
        };

        let request = ApiRequest::post(self.client.oauth_token_path())
            .omit_api_path()
            .json(&body)?;

        let response = self
            .client
            .send(&request)
            .await?
            .into_envelope::<OAuthToken>();

        if let Some(err) = response.error() {
            tracing::warn!(status = response.status, error = %err, "token request failed");
        }

        Ok(response.into_data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> NowClient {
        NowClient::new("/api/now/table", "https://example.test").unwrap()
    }

    #[test]
    fn test_authorize_without_details_fails() {
        let client = client();
        assert!(matches!(
            client.oauth().authorize(),
            Err(NowError::NoClientDetails)
        ));
    }

    #[test]
    fn test_authorize_url() {
        let client = client();
        client
            .oauth()
            .set_client_details(OAuthClient::new("my id", "shh"));

        let url = client.oauth().authorize().unwrap();
        let state = client.oauth().state().to_string();

        assert!(url.starts_with("https://example.test/oauth_auth.do?"));
        assert!(url.contains("client_id=my+id"));
        assert!(url.contains("client_secret=shh"));
        assert!(url.contains(&format!("state={state}")));
        assert!(url.contains("grant_type=authorization_code"));
        assert!(url.ends_with("response_type=code"));
    }

    #[test]
    fn test_state_is_stable_per_client() {
        let client = client();
        assert_eq!(client.oauth().state(), client.oauth().state());
        assert_eq!(client.oauth().state().len(), 32);
        assert!(client
            .oauth()
            .state()
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_generate_without_details_fails() {
        let result = client().oauth().generate("code", DEFAULT_REDIRECT_URL).await;
        assert!(matches!(result, Err(NowError::NoClientDetails)));
    }

    #[test]
    fn test_token_request_body() {
        let body = TokenRequest {
            grant_type: "refresh_token",
            redirect_uri: DEFAULT_REDIRECT_URL,
            client_id: "id",
            client_secret: "secret",
            code: None,
            refresh_token: Some("r1"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["refresh_token"], "r1");
        assert!(json.get("code").is_none());
    }
}
