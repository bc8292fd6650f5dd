//! Attachment endpoint handlers.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{
        header::{CONTENT_TYPE, HOST},
        HeaderMap, StatusCode,
    },
    response::IntoResponse,
};
use serde::Deserialize;

use super::{error, result};
use crate::mock_server::state::SharedState;
use crate::Attachment;

/// Query parameters for listing attachments.
#[derive(Debug, Default, Deserialize)]
pub struct ListAttachmentsQuery {
    pub sysparm_query: Option<String>,
    pub sysparm_limit: Option<usize>,
    pub sysparm_offset: Option<usize>,
}

/// Query parameters for an upload.
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub table_name: String,
    pub table_sys_id: String,
    pub file_name: String,
}

fn not_found(sys_id: &str) -> axum::response::Response {
    error(
        StatusCode::NOT_FOUND,
        "Record doesn't exist",
        &format!("No attachment with sys_id {sys_id}"),
    )
}

/// GET /api/now/attachment
pub async fn list_attachments(
    State(state): State<SharedState>,
    Query(query): Query<ListAttachmentsQuery>,
) -> impl IntoResponse {
    let state = state.read().await;

    let attachments: Vec<Attachment> = state
        .list_attachments(query.sysparm_query.as_deref())
        .into_iter()
        .skip(query.sysparm_offset.unwrap_or(0))
        .take(query.sysparm_limit.unwrap_or(1000))
        .cloned()
        .collect();

    result(StatusCode::OK, attachments)
}

/// GET /api/now/attachment/{sys_id}
pub async fn get_attachment_meta(
    State(state): State<SharedState>,
    Path(sys_id): Path<String>,
) -> impl IntoResponse {
    let state = state.read().await;

    match state.attachments.get(&sys_id) {
        Some(stored) => result(StatusCode::OK, &stored.meta),
        None => not_found(&sys_id),
    }
}

/// GET /api/now/attachment/{sys_id}/file
pub async fn get_attachment_file(
    State(state): State<SharedState>,
    Path(sys_id): Path<String>,
) -> impl IntoResponse {
    let state = state.read().await;

    match state.attachments.get(&sys_id) {
        Some(stored) => {
            let content_type = stored
                .meta
                .content_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string());
            (
                StatusCode::OK,
                [(CONTENT_TYPE, content_type)],
                stored.content.clone(),
            )
                .into_response()
        }
        None => not_found(&sys_id),
    }
}

/// POST /api/now/attachment/file
pub async fn upload_attachment(
    State(state): State<SharedState>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("application/octet-stream");
    let base_url = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(|host| format!("http://{host}"))
        .unwrap_or_default();

    let mut state = state.write().await;
    let meta = state.create_attachment(
        &query.table_name,
        &query.table_sys_id,
        &query.file_name,
        content_type,
        body.to_vec(),
        &base_url,
    );

    result(StatusCode::CREATED, meta)
}

/// DELETE /api/now/attachment/{sys_id}
pub async fn delete_attachment(
    State(state): State<SharedState>,
    Path(sys_id): Path<String>,
) -> impl IntoResponse {
    let mut state = state.write().await;

    match state.attachments.remove(&sys_id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(&sys_id),
    }
}
