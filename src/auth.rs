//! Credential values and the authentication state derived from them.
//!
//! A client is in exactly one of two modes, Basic or OAuth, and the mode is
//! never stored on its own: it is read off the shape of the credential the
//! client currently holds. Replacing credentials builds a fresh
//! [`AuthState`] instead of editing the old one.

use std::env;
use std::fmt;

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};

use crate::error::{NowError, Result};

const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Username/password pair for HTTP Basic authentication.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// OAuth application registration (client id and secret).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
}

impl OAuthClient {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClient")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Token set returned by the OAuth token endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: String,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Lifetime hint in seconds. Not used to pre-empt expiry; a 401 is what
    /// triggers a refresh.
    #[serde(default)]
    pub expires_in: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

impl OAuthToken {
    /// Create a bearer token.
    pub fn bearer(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: default_token_type(),
            expires_in: 0,
            scope: None,
        }
    }
}

impl fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthToken")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Client registration plus the token issued to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthCredentials {
    #[serde(flatten)]
    pub client: OAuthClient,
    #[serde(flatten)]
    pub token: OAuthToken,
}

impl OAuthCredentials {
    pub fn new(client: OAuthClient, token: OAuthToken) -> Self {
        Self { client, token }
    }

    /// Keep the client registration and swap in a newly issued token.
    #[must_use]
    pub fn refreshed(&self, token: OAuthToken) -> Self {
        Self {
            client: self.client.clone(),
            token,
        }
    }

    /// Value for the `Authorization` header, e.g. `Bearer abc`.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token.token_type, self.token.access_token)
    }
}

/// Credentials accepted by the client.
///
/// Deserializes without a tag: a JSON object carrying `access_token` is an
/// OAuth bundle, anything with `username`/`password` is Basic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Credentials {
    OAuth(OAuthCredentials),
    Basic(BasicCredentials),
}

impl Credentials {
    /// Shorthand for Basic credentials.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic(BasicCredentials::new(username, password))
    }

    /// Shorthand for an OAuth bundle.
    pub fn oauth(client: OAuthClient, token: OAuthToken) -> Self {
        Self::OAuth(OAuthCredentials::new(client, token))
    }

    /// The authentication mode these credentials select.
    pub fn mode(&self) -> AuthMode {
        match self {
            Self::Basic(_) => AuthMode::Basic,
            Self::OAuth(_) => AuthMode::OAuth,
        }
    }

    /// Read credentials from the environment.
    ///
    /// OAuth wins when `NOW_ACCESS_TOKEN` is set, and then also needs
    /// `NOW_CLIENT_ID` and `NOW_CLIENT_SECRET` (`NOW_REFRESH_TOKEN` and
    /// `NOW_TOKEN_TYPE` are optional). Otherwise `NOW_USERNAME` and
    /// `NOW_PASSWORD` are required.
    ///
    /// # Errors
    ///
    /// Returns [`NowError::ConfigMissing`] naming the first absent variable.
    pub fn from_env() -> Result<Self> {
        if let Ok(access_token) = env::var("NOW_ACCESS_TOKEN") {
            let client = OAuthClient::new(
                require_env("NOW_CLIENT_ID")?,
                require_env("NOW_CLIENT_SECRET")?,
            );
            let token = OAuthToken {
                access_token,
                refresh_token: env::var("NOW_REFRESH_TOKEN").unwrap_or_default(),
                token_type: env::var("NOW_TOKEN_TYPE").unwrap_or_else(|_| default_token_type()),
                expires_in: 0,
                scope: None,
            };
            return Ok(Self::oauth(client, token));
        }

        Ok(Self::basic(require_env("NOW_USERNAME")?, require_env("NOW_PASSWORD")?))
    }

    /// Attach these credentials to an outgoing request.
    pub(crate) fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Basic(basic) => builder.basic_auth(&basic.username, Some(&basic.password)),
            Self::OAuth(oauth) => {
                builder.header(reqwest::header::AUTHORIZATION, oauth.authorization_header())
            }
        }
    }
}

impl From<BasicCredentials> for Credentials {
    fn from(value: BasicCredentials) -> Self {
        Self::Basic(value)
    }
}

impl From<OAuthCredentials> for Credentials {
    fn from(value: OAuthCredentials) -> Self {
        Self::OAuth(value)
    }
}

fn require_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| NowError::ConfigMissing(format!("{name} environment variable not set")))
}

/// Which authentication scheme requests are sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// HTTP Basic. Also the mode of a client that holds no credentials yet.
    #[default]
    Basic,
    /// `Authorization: <token_type> <access_token>`, refreshed on 401.
    OAuth,
}

impl AuthMode {
    /// Derive the mode from whatever credential is held, if any.
    pub fn of(credentials: Option<&Credentials>) -> Self {
        credentials.map(Credentials::mode).unwrap_or_default()
    }
}

/// Snapshot of a client's authentication configuration.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    credentials: Option<Credentials>,
    oauth_client: Option<OAuthClient>,
}

impl AuthState {
    /// State holding the given credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self::default().with_credentials(credentials)
    }

    /// A new state with `credentials` replacing whatever was held.
    ///
    /// OAuth credentials also seed the OAuth client details; Basic
    /// credentials leave previously seeded client details alone.
    #[must_use]
    pub fn with_credentials(&self, credentials: Credentials) -> Self {
        let oauth_client = match &credentials {
            Credentials::OAuth(oauth) => Some(oauth.client.clone()),
            Credentials::Basic(_) => self.oauth_client.clone(),
        };
        Self {
            credentials: Some(credentials),
            oauth_client,
        }
    }

    /// A new state with different OAuth client details.
    #[must_use]
    pub fn with_oauth_client(&self, client: OAuthClient) -> Self {
        Self {
            credentials: self.credentials.clone(),
            oauth_client: Some(client),
        }
    }

    pub fn mode(&self) -> AuthMode {
        AuthMode::of(self.credentials.as_ref())
    }

    /// True for Basic credentials, or for OAuth credentials with a
    /// non-empty access token.
    pub fn is_authenticated(&self) -> bool {
        match &self.credentials {
            Some(Credentials::Basic(_)) => true,
            Some(Credentials::OAuth(oauth)) => !oauth.token.access_token.is_empty(),
            None => false,
        }
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// The OAuth bundle, when in OAuth mode.
    pub fn oauth_credentials(&self) -> Option<&OAuthCredentials> {
        match &self.credentials {
            Some(Credentials::OAuth(oauth)) => Some(oauth),
            _ => None,
        }
    }

    pub fn oauth_client(&self) -> Option<&OAuthClient> {
        self.oauth_client.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oauth() -> Credentials {
        Credentials::oauth(
            OAuthClient::new("id", "secret"),
            OAuthToken::bearer("access", "refresh"),
        )
    }

    #[test]
    fn test_empty_state_is_basic_and_unauthenticated() {
        let state = AuthState::default();
        assert_eq!(state.mode(), AuthMode::Basic);
        assert!(!state.is_authenticated());
    }

    #[test]
    fn test_mode_follows_last_credentials() {
        let state = AuthState::new(oauth());
        assert_eq!(state.mode(), AuthMode::OAuth);
        assert!(state.is_authenticated());

        let state = state.with_credentials(Credentials::basic("admin", "pw"));
        assert_eq!(state.mode(), AuthMode::Basic);
        assert!(state.is_authenticated());
        assert!(state.oauth_credentials().is_none());
        // client details survive a switch to Basic
        assert_eq!(state.oauth_client().unwrap().client_id, "id");
    }

    #[test]
    fn test_oauth_without_access_token_is_unauthenticated() {
        let state = AuthState::new(Credentials::oauth(
            OAuthClient::new("id", "secret"),
            OAuthToken::bearer("", "refresh"),
        ));
        assert_eq!(state.mode(), AuthMode::OAuth);
        assert!(!state.is_authenticated());
    }

    #[test]
    fn test_untagged_deserialize_discriminates_on_access_token() {
        let basic: Credentials =
            serde_json::from_value(serde_json::json!({"username": "a", "password": "b"})).unwrap();
        assert_eq!(basic.mode(), AuthMode::Basic);

        let oauth: Credentials = serde_json::from_value(serde_json::json!({
            "client_id": "id",
            "client_secret": "secret",
            "access_token": "tok",
            "refresh_token": "ref",
            "token_type": "Bearer",
            "expires_in": 1799
        }))
        .unwrap();
        assert_eq!(oauth.mode(), AuthMode::OAuth);
    }

    #[test]
    fn test_refreshed_keeps_client_details() {
        let Credentials::OAuth(creds) = oauth() else {
            panic!("expected OAuth");
        };
        let next = creds.refreshed(OAuthToken::bearer("new-access", "new-refresh"));
        assert_eq!(next.client, creds.client);
        assert_eq!(next.authorization_header(), "Bearer new-access");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let debug = format!("{:?} {:?}", oauth(), Credentials::basic("admin", "hunter2"));
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("access"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("admin"));
    }
}
