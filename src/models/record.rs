use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single cited source returned by the research engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
}

/// A completed research report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResult {
    pub query: String,
    pub report_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    pub report: String,
    pub costs: f64,
    pub sources: Vec<Source>,
    pub images: Vec<String>,
    pub elapsed_secs: f64,
    pub cached: bool,
    pub completed_at: DateTime<Utc>,
    pub report_id: String,
    pub request_id: String,
}

/// An error-shaped record persisted when a research run fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchFailure {
    pub error: String,
    pub query: String,
    pub report_type: String,
    pub failed_at: DateTime<Utc>,
    pub report_id: String,
    pub request_id: String,
}

impl ResearchFailure {
    pub fn new(error: String, query: String, report_type: String, request_id: String) -> Self {
        Self {
            error,
            query,
            report_type,
            failed_at: Utc::now(),
            report_id: Uuid::new_v4().to_string(),
            request_id,
        }
    }
}

/// On-disk record: one JSON file per completed or failed research run.
/// Success and failure share a namespace; callers distinguish them by shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredRecord {
    Completed(ResearchResult),
    Failed(ResearchFailure),
}

impl StoredRecord {
    pub fn report_id(&self) -> &str {
        match self {
            StoredRecord::Completed(result) => &result.report_id,
            StoredRecord::Failed(failure) => &failure.report_id,
        }
    }

    pub fn request_id(&self) -> &str {
        match self {
            StoredRecord::Completed(result) => &result.request_id,
            StoredRecord::Failed(failure) => &failure.request_id,
        }
    }
}
