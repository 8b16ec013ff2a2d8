use axum::{Extension, Json, extract::State};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;

use crate::api::response::ApiResponse;
use crate::api::state::AppState;
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
pub struct TaskEntry {
    pub done: bool,
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// GET /tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
) -> Json<ApiResponse<serde_json::Value>> {
    let entries: HashMap<String, TaskEntry> = state
        .registry
        .snapshot()
        .into_iter()
        .map(|info| {
            (
                info.request_id.clone(),
                TaskEntry {
                    done: info.is_done(),
                    failed: info.is_failed(),
                    error: info.error,
                },
            )
        })
        .collect();

    let message = format!("Active tasks: {}", entries.len());
    Json(ApiResponse::ok(
        request_id,
        message,
        json!({"active_tasks": entries}),
    ))
}
