//! OAuth relay handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;

use super::{error, result};
use crate::mock_server::state::SharedState;

/// Body posted to the token relay.
#[derive(Debug, Deserialize)]
pub struct TokenRequestBody {
    pub grant_type: String,
    pub client_id: String,
    pub client_secret: String,
    #[allow(dead_code)] // Sent by clients but not checked by the mock
    pub redirect_uri: Option<String>,
    pub code: Option<String>,
    pub refresh_token: Option<String>,
}

/// POST /api/x_flowm_mobile/fmm_oauth/oauth_relay
pub async fn token_relay(
    State(state): State<SharedState>,
    Json(body): Json<TokenRequestBody>,
) -> impl IntoResponse {
    let mut state = state.write().await;

    if !state.verify_client(&body.client_id, &body.client_secret) {
        return error(
            StatusCode::UNAUTHORIZED,
            "invalid_client",
            "Client id or secret not recognised",
        );
    }

    let token = match body.grant_type.as_str() {
        "authorization_code" => body
            .code
            .as_deref()
            .and_then(|code| state.redeem_code(code, &body.client_id)),
        "refresh_token" => body
            .refresh_token
            .as_deref()
            .and_then(|token| state.redeem_refresh_token(token, &body.client_id)),
        other => {
            return error(
                StatusCode::BAD_REQUEST,
                "unsupported_grant_type",
                &format!("Grant type {other} is not supported"),
            )
        }
    };

    match token {
        Some(token) => result(StatusCode::OK, token),
        None => error(
            StatusCode::BAD_REQUEST,
            "invalid_grant",
            "Code or refresh token is invalid or already used",
        ),
    }
}
