//! Table endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{error, result};
use crate::mock_server::state::SharedState;
use crate::Record;

/// Query parameters for listing records.
#[derive(Debug, Default, Deserialize)]
pub struct ListRecordsQuery {
    pub sysparm_query: Option<String>,
    pub sysparm_limit: Option<usize>,
    pub sysparm_offset: Option<usize>,
    pub sysparm_fields: Option<String>,
}

/// Query parameters for a single record.
#[derive(Debug, Default, Deserialize)]
pub struct GetRecordQuery {
    pub sysparm_fields: Option<String>,
}

fn not_found() -> Response {
    error(
        StatusCode::NOT_FOUND,
        "No Record found",
        "Record doesn't exist or ACL restricts the record retrieval",
    )
}

fn select_fields(record: &Record, fields: Option<&str>) -> Record {
    let Some(fields) = fields else {
        return record.clone();
    };
    let wanted: Vec<&str> = fields.split(',').map(str::trim).collect();
    Record {
        sys_id: record.sys_id.clone(),
        fields: record
            .fields
            .iter()
            .filter(|(k, _)| wanted.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

/// GET /api/now/table/{table}
pub async fn list_records(
    State(state): State<SharedState>,
    Path(table): Path<String>,
    Query(query): Query<ListRecordsQuery>,
) -> impl IntoResponse {
    let state = state.read().await;

    let offset = query.sysparm_offset.unwrap_or(0);
    let limit = query.sysparm_limit.unwrap_or(10_000);

    let records: Vec<Record> = state
        .list_records(&table, query.sysparm_query.as_deref())
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|r| select_fields(r, query.sysparm_fields.as_deref()))
        .collect();

    result(StatusCode::OK, records)
}

/// GET /api/now/table/{table}/{sys_id}
pub async fn get_record(
    State(state): State<SharedState>,
    Path((table, sys_id)): Path<(String, String)>,
    Query(query): Query<GetRecordQuery>,
) -> impl IntoResponse {
    let state = state.read().await;

    match state.get_record(&table, &sys_id) {
        Some(record) => result(
            StatusCode::OK,
            select_fields(record, query.sysparm_fields.as_deref()),
        ),
        None => not_found(),
    }
}

/// POST /api/now/table/{table}
pub async fn create_record(
    State(state): State<SharedState>,
    Path(table): Path<String>,
    Json(fields): Json<Map<String, Value>>,
) -> impl IntoResponse {
    let mut state = state.write().await;
    let record = state.create_record(&table, fields);
    result(StatusCode::CREATED, record)
}

/// PATCH /api/now/table/{table}/{sys_id}
pub async fn patch_record(
    State(state): State<SharedState>,
    Path((table, sys_id)): Path<(String, String)>,
    Json(fields): Json<Map<String, Value>>,
) -> impl IntoResponse {
    let mut state = state.write().await;

    match state.update_record(&table, &sys_id, fields, false) {
        Some(record) => result(StatusCode::OK, record),
        None => not_found(),
    }
}

/// PUT /api/now/table/{table}/{sys_id}
pub async fn put_record(
    State(state): State<SharedState>,
    Path((table, sys_id)): Path<(String, String)>,
    Json(fields): Json<Map<String, Value>>,
) -> impl IntoResponse {
    let mut state = state.write().await;

    match state.update_record(&table, &sys_id, fields, true) {
        Some(record) => result(StatusCode::OK, record),
        None => not_found(),
    }
}

/// DELETE /api/now/table/{table}/{sys_id}
pub async fn delete_record(
    State(state): State<SharedState>,
    Path((table, sys_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let mut state = state.write().await;

    if state.delete_record(&table, &sys_id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found()
    }
}
