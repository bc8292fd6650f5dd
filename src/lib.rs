//! ServiceNow API client library.
//!
//! A Rust library for the ServiceNow REST APIs: table CRUD, attachments,
//! OAuth token issuance and the mobile sync endpoint. Every wrapper sends its
//! requests through a [`NowClient`], which attaches Basic or OAuth
//! credentials and, in OAuth mode, recovers from an expired access token by
//! refreshing it once and replaying the request.
//!
//! # Quick Start
//!
//! ```no_run
//! use nowapi::{Credentials, NowClient, TableApi, TableGetParams};
//!
//! #[tokio::main]
//! async fn main() -> nowapi::Result<()> {
//!     // Base URL and credentials from NOW_* environment variables
//!     let client = NowClient::from_env("/api/now/table")?;
//!     let table = TableApi::from_client(&client)?;
//!
//!     let response = table
//!         .get_record("incident", "abc123", &TableGetParams::default())
//!         .await?;
//!
//!     match response.result {
//!         Ok(Some(record)) => println!("Incident: {:?}", record.value("number")),
//!         Ok(None) => println!("No content ({})", response.status),
//!         Err(err) => eprintln!("Failed with {}: {err}", response.status),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Responses
//!
//! Remote failures never surface as `Err`. Every call resolves to an
//! [`ApiResponse`] carrying the HTTP status, or a negative transport code
//! such as `-111` for a refused connection, plus either the unwrapped
//! `result` payload or an [`ApiError`]. `Err` is reserved for requests that
//! could not be built.
//!
//! # Configuration
//!
//! - `NOW_INSTANCE_URL` - instance base URL; otherwise `NOW_ENV=production`
//!   picks [`DEFAULT_BASE_URL`] and anything else [`DEFAULT_DEV_BASE_URL`]
//! - `NOW_USERNAME` / `NOW_PASSWORD` - Basic credentials
//! - `NOW_CLIENT_ID`, `NOW_CLIENT_SECRET`, `NOW_ACCESS_TOKEN`,
//!   `NOW_REFRESH_TOKEN`, `NOW_TOKEN_TYPE` - OAuth credentials
//! - `NOW_TIMEOUT_MS` - per-request timeout

mod api;
mod auth;
mod chars;
mod client;
mod error;
mod locale;
mod models;
mod oauth;
mod request;
mod response;

pub mod cli;
pub mod output;

#[cfg(feature = "test-server")]
pub mod mock_server;

// Re-export core types
pub use client::{default_base_url, NowClient, DEFAULT_BASE_URL, DEFAULT_DEV_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{NowError, Result};
pub use request::{ApiRequest, RequestBody};
pub use response::{
    ApiError, ApiResponse, TransportError, REQUEST_ERROR_DETAIL, RESPONSE_ERROR_DETAIL,
};

// Re-export auth
pub use auth::{
    AuthMode, AuthState, BasicCredentials, Credentials, OAuthClient, OAuthCredentials, OAuthToken,
};
pub use oauth::{OAuthApi, AUTHORIZE_PATH, DEFAULT_OAUTH_RELAY, DEFAULT_REDIRECT_URL};

// Re-export endpoint wrappers
pub use api::{
    AttachmentApi, SyncApi, TableApi, DEFAULT_ATTACHMENT_URL, DEFAULT_SYNC_URL, DEFAULT_TABLE_URL,
};

// Re-export models
pub use models::{
    // Table types
    DisplayValue,
    LabelValue,
    ListView,
    Record,
    SystemRecord,
    TableDeleteParams,
    TableGetParams,
    TableListParams,
    TableWriteParams,
    // Attachment types
    Attachment,
    AttachmentListParams,
    AttachmentUploadParams,
    // Sync types
    App,
    AppData,
    AppElement,
    AppField,
    AppForm,
    AppList,
    AppTable,
    Checksum,
    ChecksumData,
    RecordProducer,
};

// Re-export helpers
pub use chars::{generate_characters, CharacterSet};
pub use locale::{
    format_glide_date, format_glide_date_time, parse_glide_date, parse_glide_date_time,
    parse_glide_date_time_utc, GLIDE_DATE_FORMAT, GLIDE_DATE_TIME_FORMAT,
};
