use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::api::response::ApiResponse;
use crate::api::state::AppState;
use crate::error::ApiError;
use crate::middleware::RequestId;
use crate::models::{ResearchRequest, StatusResponse, StoredRecord, TaskStatus};
use crate::services::research::spawn_research;

const DEFAULT_LIST_LIMIT: u32 = 10;
const MAX_LIST_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    limit: Option<u32>,
    offset: Option<u32>,
}

// POST /research
pub async fn submit_research(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Json(request): Json<ResearchRequest>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    info!(request_id, "research request received");

    request.validate().map_err(ApiError::Validation)?;

    spawn_research(state.clone(), request, request_id.clone());

    Ok(Json(ApiResponse::ok(
        request_id,
        "Research task started successfully. Check the status endpoint for results.",
        json!({"task_status": "processing"}),
    )))
}

// GET /status/{request_id}
pub async fn get_status(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Json<ApiResponse<Value>> {
    if let Some(info) = state.registry.get(&request_id) {
        if info.status == TaskStatus::Processing {
            return Json(ApiResponse::ok(
                request_id,
                "Research is still in progress",
                json!({"task_status": "processing"}),
            ));
        }
    }

    // The registry entry is gone once the task finishes; the durable record
    // is the source of truth from then on.
    match state.store.find_by_request(&request_id) {
        Some(StoredRecord::Completed(result)) => {
            let data = serde_json::to_value(&result).unwrap_or(Value::Null);
            Json(ApiResponse::ok(
                request_id,
                "Research completed successfully",
                data,
            ))
        }
        Some(StoredRecord::Failed(failure)) => Json(ApiResponse::error(
            request_id,
            format!("Research failed: {}", failure.error),
        )),
        None => Json(ApiResponse::error(request_id, "Research task not found")),
    }
}

// GET /research/{report_id}
pub async fn get_research(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<Json<StoredRecord>, ApiError> {
    match state.store.get_by_id(&report_id) {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(format!(
            "Research report with ID {report_id} not found"
        ))),
    }
}

// GET /research?limit&offset
pub async fn list_research(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<StoredRecord>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if limit < 1 || limit > MAX_LIST_LIMIT {
        return Err(ApiError::Validation(format!(
            "limit must be between 1 and {MAX_LIST_LIMIT}"
        )));
    }
    let offset = params.offset.unwrap_or(0);

    Ok(Json(state.store.list(limit as usize, offset as usize)))
}

// DELETE /research/{report_id}
pub async fn delete_research(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    if state.store.delete(&report_id) {
        Ok(Json(StatusResponse::success(format!(
            "Research report with ID {report_id} deleted successfully"
        ))))
    } else {
        Err(ApiError::NotFound(format!(
            "Research report with ID {report_id} not found"
        )))
    }
}
