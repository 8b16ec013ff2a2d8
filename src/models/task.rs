use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Processing,
    Completed,
    Failed,
}

/// In-memory bookkeeping for one launched research task. Never persisted;
/// the durable record lives in the result store.
#[derive(Debug, Clone, Serialize)]
pub struct TaskInfo {
    pub request_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl TaskInfo {
    pub fn processing(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            status: TaskStatus::Processing,
            error: None,
            started_at: Utc::now(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.status != TaskStatus::Processing
    }

    pub fn is_failed(&self) -> bool {
        self.status == TaskStatus::Failed
    }
}
