//! Mock ServiceNow instance for E2E testing.
//!
//! This module provides an in-memory mock server that simulates a ServiceNow
//! instance for integration and end-to-end testing. Unlike wiremock which
//! mocks at the HTTP level per-test, this server maintains state across
//! requests: records persist between calls, refresh tokens rotate, and
//! access tokens can be expired mid-test to exercise the refresh path.
//!
//! # Example
//!
//! ```ignore
//! use nowapi::mock_server::{Fixtures, MockServer};
//! use nowapi::{Credentials, TableApi};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let api = TableApi::new(
//!         Credentials::basic(Fixtures::USERNAME, Fixtures::PASSWORD),
//!         Some(server.url()),
//!     )
//!     .unwrap();
//!
//!     // Server comes with default fixtures
//!     let response = api.get_record("incident", "abc123", &Default::default()).await.unwrap();
//!     assert_eq!(response.data().unwrap().value("number"), Some("INC0010001"));
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::{DefaultScenario, Fixtures};
pub use server::MockServer;
pub use state::{checksum, new_sys_id, MockApp, MockState, StoredAttachment, TOKEN_LIFETIME};
