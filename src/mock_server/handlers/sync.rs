//! Sync endpoint handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::{error, result};
use crate::mock_server::state::SharedState;
use crate::{App, AppData, Checksum, ChecksumData};

/// `?id=` selecting an app.
#[derive(Debug, Deserialize)]
pub struct AppQuery {
    pub id: String,
}

fn unknown_app(id: &str) -> axum::response::Response {
    error(StatusCode::NOT_FOUND, "Unknown app", &format!("No app with id {id}"))
}

/// GET /api/x_flowm_mobile/sync/config
pub async fn get_config(
    State(state): State<SharedState>,
    Query(query): Query<AppQuery>,
) -> impl IntoResponse {
    let state = state.read().await;

    match state.apps.get(&query.id) {
        Some(app) => result(
            StatusCode::OK,
            ChecksumData {
                checksum: app.config_checksum,
                data: &app.config,
            },
        ),
        None => unknown_app(&query.id),
    }
}

/// GET /api/x_flowm_mobile/sync/config/checksum
pub async fn get_config_checksum(
    State(state): State<SharedState>,
    Query(query): Query<AppQuery>,
) -> impl IntoResponse {
    let state = state.read().await;

    match state.apps.get(&query.id) {
        Some(app) => result(
            StatusCode::OK,
            Checksum {
                checksum: app.config_checksum,
            },
        ),
        None => unknown_app(&query.id),
    }
}

/// POST /api/x_flowm_mobile/sync/data
pub async fn get_data(State(state): State<SharedState>, Json(config): Json<App>) -> impl IntoResponse {
    let state = state.read().await;

    match state.apps.get(&config.id) {
        Some(app) => result(
            StatusCode::OK,
            ChecksumData {
                checksum: app.data_checksum,
                data: &app.data,
            },
        ),
        None => unknown_app(&config.id),
    }
}

/// GET /api/x_flowm_mobile/sync/data/checksum
pub async fn get_data_checksum(
    State(state): State<SharedState>,
    Query(query): Query<AppQuery>,
) -> impl IntoResponse {
    let state = state.read().await;

    match state.apps.get(&query.id) {
        Some(app) => result(
            StatusCode::OK,
            Checksum {
                checksum: app.data_checksum,
            },
        ),
        None => unknown_app(&query.id),
    }
}

/// POST /api/x_flowm_mobile/sync/data/sync
pub async fn sync_data(State(state): State<SharedState>, Json(data): Json<AppData>) -> impl IntoResponse {
    state.write().await.sync_data(data);
    result(StatusCode::OK, true)
}
