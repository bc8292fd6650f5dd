//! ServiceNow API client.
//!
//! Low-level HTTP executor that handles authentication and raw requests.
//! Endpoint wrappers ([`TableApi`](crate::TableApi) and friends) build
//! [`ApiRequest`]s and hand them to [`NowClient::request`].

use std::env;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::auth::{AuthMode, AuthState, Credentials};
use crate::chars::{generate_characters, CharacterSet};
use crate::error::{NowError, Result};
use crate::oauth::{Grant, OAuthApi, DEFAULT_OAUTH_RELAY, DEFAULT_REDIRECT_URL};
use crate::request::{ApiRequest, RequestBody};
use crate::response::{ApiResponse, Exchange, TransportError};

/// Production instance.
pub const DEFAULT_BASE_URL: &str = "https://flowmotion.service-now.com";
/// Development instance, used unless `NOW_ENV=production`.
pub const DEFAULT_DEV_BASE_URL: &str = "https://flowmotiondev.service-now.com";
/// Per-request timeout applied until [`NowClient::set_request_timeout`] is called.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

const USER_AGENT: &str = concat!("nowapi/", env!("CARGO_PKG_VERSION"));
const OAUTH_STATE_LEN: usize = 32;

/// The instance URL for the current environment.
///
/// `NOW_INSTANCE_URL` wins; otherwise `NOW_ENV=production` selects
/// [`DEFAULT_BASE_URL`] and anything else [`DEFAULT_DEV_BASE_URL`].
pub fn default_base_url() -> String {
    if let Ok(url) = env::var("NOW_INSTANCE_URL") {
        return url;
    }
    match env::var("NOW_ENV").as_deref() {
        Ok("production") => DEFAULT_BASE_URL.to_string(),
        _ => DEFAULT_DEV_BASE_URL.to_string(),
    }
}

/// Mutable request settings, separate from credentials.
#[derive(Debug, Clone)]
struct Settings {
    default_headers: HeaderMap,
    timeout: Duration,
    oauth_token_path: String,
}

struct Inner {
    http: Client,
    base_url: String,
    api_path: String,
    oauth_state: String,
    auth: RwLock<Arc<AuthState>>,
    settings: RwLock<Settings>,
}

/// Authenticated request executor for one ServiceNow API family.
///
/// A client is bound to an instance URL and an API path such as
/// `/api/now/table`. It attaches Basic or OAuth credentials to every request
/// and, in OAuth mode, recovers from a single 401 by refreshing the token and
/// replaying the request once.
///
/// This struct is cheaply cloneable; clones share credentials, settings and
/// the underlying connection pool.
///
/// Two requests that hit a 401 at the same time will each refresh the token.
/// Refreshes are not deduplicated; the last one to finish wins.
///
/// # Example
///
/// ```no_run
/// use nowapi::{Credentials, NowClient};
///
/// # async fn example() -> nowapi::Result<()> {
/// let client = NowClient::new("/api/now/table", "https://dev12345.service-now.com")?;
/// client.set_credentials(Credentials::basic("admin", "password"));
///
/// let response = client.get::<serde_json::Value>("/incident/abc123").await?;
/// println!("{} {:?}", response.status, response.data());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NowClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for NowClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NowClient")
            .field("base_url", &self.inner.base_url)
            .field("api_path", &self.inner.api_path)
            .field("mode", &self.auth_mode())
            .finish_non_exhaustive()
    }
}

impl NowClient {
    /// Create a client for `api_path` on the instance at `base_url`.
    ///
    /// No credentials are set; call [`set_credentials`](Self::set_credentials).
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(api_path: &str, base_url: &str) -> Result<Self> {
        Url::parse(base_url)?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(NowError::HttpError)?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.to_string(),
                api_path: api_path.to_string(),
                oauth_state: generate_characters(OAUTH_STATE_LEN, CharacterSet::az09),
                auth: RwLock::new(Arc::new(AuthState::default())),
                settings: RwLock::new(Settings {
                    default_headers: HeaderMap::new(),
                    timeout: DEFAULT_TIMEOUT,
                    oauth_token_path: DEFAULT_OAUTH_RELAY.to_string(),
                }),
            }),
        })
    }

    /// Create a client against [`default_base_url`].
    ///
    /// # Errors
    ///
    /// Returns an error if the resolved base URL is invalid.
    pub fn with_default_base(api_path: &str) -> Result<Self> {
        Self::new(api_path, &default_base_url())
    }

    /// Create a client from environment variables.
    ///
    /// The base URL comes from [`default_base_url`], credentials from
    /// [`Credentials::from_env`], and `NOW_TIMEOUT_MS` optionally overrides
    /// the request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing or `NOW_TIMEOUT_MS` is not
    /// a number.
    pub fn from_env(api_path: &str) -> Result<Self> {
        let client = Self::with_default_base(api_path)?;
        client.set_credentials(Credentials::from_env()?);

        if let Ok(ms) = env::var("NOW_TIMEOUT_MS") {
            let ms: u64 = ms.parse().map_err(|_| {
                NowError::ConfigMissing(format!("NOW_TIMEOUT_MS is not a number: {ms}"))
            })?;
            client.set_request_timeout(Duration::from_millis(ms));
        }

        Ok(client)
    }

    /// A client for a different API path on the same instance, sharing this
    /// client's credentials snapshot and settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn for_api_path(&self, api_path: &str) -> Result<Self> {
        let client = Self::new(api_path, &self.inner.base_url)?;
        *client.inner.auth.write() = self.auth_state();
        *client.inner.settings.write() = self.inner.settings.read().clone();
        Ok(client)
    }

    /// Replace the credentials, and with them the authentication mode.
    ///
    /// OAuth credentials also seed the OAuth helper with their client id and
    /// secret. Basic credentials replace the held credential but keep any
    /// client details set earlier.
    pub fn set_credentials(&self, credentials: Credentials) {
        let mode = credentials.mode();
        let mut auth = self.inner.auth.write();
        *auth = Arc::new(auth.with_credentials(credentials));
        tracing::debug!(?mode, "credentials updated");
    }

    /// Alias of [`set_credentials`](Self::set_credentials).
    pub fn set_auth(&self, credentials: Credentials) {
        self.set_credentials(credentials);
    }

    /// The current authentication snapshot.
    pub fn auth_state(&self) -> Arc<AuthState> {
        Arc::clone(&self.inner.auth.read())
    }

    pub(crate) fn replace_auth_state(&self, update: impl FnOnce(&AuthState) -> AuthState) {
        let mut auth = self.inner.auth.write();
        *auth = Arc::new(update(&auth));
    }

    /// The credentials currently held, if any.
    pub fn credentials(&self) -> Option<Credentials> {
        self.auth_state().credentials().cloned()
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_state().mode()
    }

    /// Whether usable credentials are held for the current mode.
    pub fn is_authenticated(&self) -> bool {
        self.auth_state().is_authenticated()
    }

    /// Replace the headers sent with every request.
    ///
    /// Credentials are attached separately and are not affected.
    pub fn set_default_headers(&self, headers: HeaderMap) {
        self.inner.settings.write().default_headers = headers;
    }

    pub fn default_headers(&self) -> HeaderMap {
        self.inner.settings.read().default_headers.clone()
    }

    pub fn set_request_timeout(&self, timeout: Duration) {
        self.inner.settings.write().timeout = timeout;
    }

    pub fn request_timeout(&self) -> Duration {
        self.inner.settings.read().timeout
    }

    /// Path of the OAuth token endpoint, resolved against the base URL.
    pub fn set_oauth_token_path(&self, path: &str) {
        self.inner.settings.write().oauth_token_path = path.to_string();
    }

    pub fn oauth_token_path(&self) -> String {
        self.inner.settings.read().oauth_token_path.clone()
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn api_path(&self) -> &str {
        &self.inner.api_path
    }

    /// `base_url + api_path`.
    pub fn route(&self) -> String {
        format!("{}{}", self.inner.base_url, self.inner.api_path)
    }

    pub(crate) fn oauth_state(&self) -> &str {
        &self.inner.oauth_state
    }

    /// OAuth helper bound to this client.
    pub fn oauth(&self) -> OAuthApi<'_> {
        OAuthApi::new(self)
    }

    /// Send a request and unwrap the `{ "result": ... }` body into `T`.
    ///
    /// Remote and network failures come back as error envelopes. A 401 in
    /// OAuth mode triggers one token refresh and one replay of `request`.
    ///
    /// # Errors
    ///
    /// Only for requests that cannot be built (bad header values and the
    /// like); nothing the server does produces an `Err`.
    #[tracing::instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn request<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<ApiResponse<T>> {
        Ok(self.exchange(request).await?.into_envelope())
    }

    /// Like [`request`](Self::request), but keeps the success body as raw
    /// bytes instead of unwrapping `result`. For file downloads.
    ///
    /// # Errors
    ///
    /// Only for requests that cannot be built.
    #[tracing::instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn download(&self, request: &ApiRequest) -> Result<ApiResponse<Vec<u8>>> {
        Ok(self.exchange(request).await?.into_raw_envelope())
    }

    /// Make a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>> {
        self.request(&ApiRequest::get(path)).await
    }

    /// Make a GET request with query parameters.
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.request(&ApiRequest::get(path).query(query)?).await
    }

    /// Make a DELETE request.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>> {
        self.request(&ApiRequest::delete(path)).await
    }

    /// Make a POST request with JSON body.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(&ApiRequest::post(path).json(body)?).await
    }

    /// Make a PUT request with JSON body.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(&ApiRequest::put(path).json(body)?).await
    }

    /// Make a PATCH request with JSON body.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(&ApiRequest::patch(path).json(body)?).await
    }

    /// Attempt, then on a refreshable 401 refresh and retry exactly once.
    async fn exchange(&self, request: &ApiRequest) -> Result<Exchange> {
        let first = self.send(request).await?;
        if !first.is_unauthorized() {
            return Ok(first);
        }

        let auth = self.auth_state();
        let Some(credentials) = auth.oauth_credentials() else {
            return Ok(first);
        };

        tracing::info!("access token rejected, refreshing");
        let grant = Grant::RefreshToken(&credentials.token.refresh_token);
        let token = self
            .oauth()
            .request_token(&credentials.client, grant, DEFAULT_REDIRECT_URL)
            .await?;

        let Some(token) = token else {
            tracing::warn!("token refresh yielded no token");
            return Ok(first);
        };

        self.set_credentials(Credentials::OAuth(credentials.refreshed(token)));
        tracing::debug!("retrying with refreshed token");
        self.send(request).await
    }

    /// One transport call with the current credentials. Never refreshes.
    pub(crate) async fn send(&self, request: &ApiRequest) -> Result<Exchange> {
        let auth = self.auth_state();
        let (mut default_headers, timeout) = {
            let settings = self.inner.settings.read();
            (settings.default_headers.clone(), settings.timeout)
        };
        // Held credentials are the only Authorization value sent.
        if auth.credentials().is_some() {
            default_headers.remove(AUTHORIZATION);
        }

        let url = request.resolve(&self.inner.base_url, &self.inner.api_path);
        let mut builder = self
            .inner
            .http
            .request(request.method().clone(), url)
            .timeout(timeout)
            .headers(default_headers);

        if let Some(credentials) = auth.credentials() {
            builder = credentials.apply(builder);
        }

        builder = builder.headers(request.header_map().clone());

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }

        builder = match request.body() {
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Bytes { content_type, data }) => builder
                .header(CONTENT_TYPE, content_type.as_str())
                .body(data.clone()),
            None => builder,
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => return Err(NowError::HttpError(e)),
            Err(e) => {
                let err = TransportError::classify(&e);
                tracing::debug!(errno = err.errno, name = err.name, "transport failure");
                return Ok(Exchange::Transport(err));
            }
        };

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "response received");

        match response.bytes().await {
            Ok(body) => Ok(Exchange::Response {
                status,
                body: body.to_vec(),
            }),
            Err(e) => Ok(Exchange::Transport(TransportError::classify(&e))),
        }
    }
}
