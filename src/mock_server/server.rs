//! Mock ServiceNow instance.
//!
//! Provides an axum-based HTTP server that simulates the table, attachment,
//! sync and OAuth relay endpoints.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::{DefaultScenario, Fixtures};
use super::handlers;
use super::state::{MockState, SharedState};
use crate::{DEFAULT_ATTACHMENT_URL, DEFAULT_OAUTH_RELAY, DEFAULT_SYNC_URL, DEFAULT_TABLE_URL};

/// A mock ServiceNow instance for testing.
///
/// The server runs in the background and can be used to test the client
/// against a realistic API implementation.
pub struct MockServer {
    /// The URL where the server is listening.
    url: String,
    /// Handle to the server task.
    handle: JoinHandle<()>,
    /// Shared state that can be modified during tests.
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a new mock server with default fixtures and accounts.
    ///
    /// Authentication is enforced: use [`Fixtures::USERNAME`] /
    /// [`Fixtures::PASSWORD`], or the seeded OAuth client and tokens.
    pub async fn start() -> Self {
        Self::with_state(Self::default_state()).await
    }

    /// Start a mock server with empty state.
    ///
    /// No data and no accounts, so every request is accepted.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a mock server with custom state.
    pub async fn with_state(state: MockState) -> Self {
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        // Bind to a random available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            url: format!("http://{}", addr),
            handle,
            state: shared_state,
        }
    }

    /// Get the base URL of the mock server.
    ///
    /// Use this as the instance URL when creating a `NowClient`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get access to the server's shared state.
    ///
    /// This allows modifying the mock data during a test, e.g. expiring
    /// tokens.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Shutdown the server.
    ///
    /// This aborts the server task. It's safe to call multiple times.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    /// Create the default state with common test fixtures.
    fn default_state() -> MockState {
        let scenario = Fixtures::default_scenario();
        Self::state_from_scenario(scenario)
            .with_user(Fixtures::USERNAME, Fixtures::PASSWORD)
            .with_oauth_client(Fixtures::CLIENT_ID, Fixtures::CLIENT_SECRET)
            .with_tokens(
                Fixtures::CLIENT_ID,
                Fixtures::ACCESS_TOKEN,
                Fixtures::REFRESH_TOKEN,
            )
            .with_authorization_code(Fixtures::AUTHORIZATION_CODE, Fixtures::CLIENT_ID)
    }

    /// Create state from a scenario.
    fn state_from_scenario(scenario: DefaultScenario) -> MockState {
        let mut state = MockState::new();

        for (table, record) in scenario.records {
            state = state.with_record(&table, record);
        }

        for (meta, content) in scenario.attachments {
            state = state.with_attachment(meta, content);
        }

        for (config, data) in scenario.apps {
            state = state.with_app(config, data);
        }

        state
    }

    /// Create the axum router with all routes.
    pub(crate) fn create_router(state: SharedState) -> Router {
        let table = DEFAULT_TABLE_URL;
        let attachment = DEFAULT_ATTACHMENT_URL;
        let sync = DEFAULT_SYNC_URL;

        let api = Router::new()
            // Table routes
            .route(
                &format!("{table}/:table"),
                get(handlers::list_records).post(handlers::create_record),
            )
            .route(
                &format!("{table}/:table/:sys_id"),
                get(handlers::get_record)
                    .put(handlers::put_record)
                    .patch(handlers::patch_record)
                    .delete(handlers::delete_record),
            )
            // Attachment routes
            .route(attachment, get(handlers::list_attachments))
            .route(
                &format!("{attachment}/file"),
                post(handlers::upload_attachment),
            )
            .route(
                &format!("{attachment}/:sys_id"),
                get(handlers::get_attachment_meta).delete(handlers::delete_attachment),
            )
            .route(
                &format!("{attachment}/:sys_id/file"),
                get(handlers::get_attachment_file),
            )
            // Sync routes
            .route(&format!("{sync}/config"), get(handlers::get_config))
            .route(
                &format!("{sync}/config/checksum"),
                get(handlers::get_config_checksum),
            )
            .route(&format!("{sync}/data"), post(handlers::get_data))
            .route(
                &format!("{sync}/data/checksum"),
                get(handlers::get_data_checksum),
            )
            .route(&format!("{sync}/data/sync"), post(handlers::sync_data))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                handlers::require_auth,
            ));

        Router::new()
            .merge(api)
            // Token relay authenticates by client id/secret in the body
            .route(DEFAULT_OAUTH_RELAY, post(handlers::token_relay))
            // Health check
            .route("/health", get(health_check))
            .with_state(state)
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}
