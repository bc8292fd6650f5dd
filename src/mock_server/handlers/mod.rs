//! HTTP request handlers for the mock server.

pub mod attachment;
pub mod oauth;
pub mod sync;
pub mod table;

pub use attachment::*;
pub use oauth::*;
pub use sync::*;
pub use table::*;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::mock_server::state::SharedState;

/// Wrap a payload the way ServiceNow does: `{ "result": ... }`.
pub(crate) fn result<T: Serialize>(status: StatusCode, value: T) -> Response {
    (status, Json(serde_json::json!({ "result": value }))).into_response()
}

/// A ServiceNow error body.
pub(crate) fn error(status: StatusCode, message: &str, detail: &str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": { "message": message, "detail": detail },
            "status": "failure"
        })),
    )
        .into_response()
}

/// Reject requests without valid Basic or Bearer credentials.
pub async fn require_auth(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if !state.read().await.is_authorized(header) {
        return error(
            StatusCode::UNAUTHORIZED,
            "User Not Authenticated",
            "Required to provide Auth information",
        );
    }

    next.run(request).await
}
