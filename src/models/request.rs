use serde::{Deserialize, Serialize};

use crate::security::validator::{
    REPORT_TYPES, TONES, contains_injection, validate_query, validate_report_type, validate_tone,
};

/// Inbound research request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub query: String,
    #[serde(default = "default_report_type")]
    pub report_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

pub fn default_report_type() -> String {
    "research_report".to_string()
}

impl ResearchRequest {
    /// Hard admission check. Rejections surface as 400s and never reach the
    /// research engine; softer defaulting happens later in the orchestrator.
    pub fn validate(&self) -> Result<(), String> {
        let query = self.query.trim();

        if contains_injection(query) {
            return Err("Query contains a potential prompt injection pattern".to_string());
        }

        if !validate_query(query) {
            return Err(
                "Query must be 3-1000 characters of mostly plain text without disallowed topics"
                    .to_string(),
            );
        }

        if !validate_report_type(&self.report_type) {
            return Err(format!(
                "Report type must be one of: {}",
                REPORT_TYPES.join(", ")
            ));
        }

        if let Some(tone) = &self.tone {
            if !validate_tone(tone) {
                return Err(format!("Tone must be one of: {}", TONES.join(", ")));
            }
        }

        Ok(())
    }
}

/// Credential exchange body for `POST /token`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}
