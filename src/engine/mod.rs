//! Boundary to the external research engine. The engine is opaque: given a
//! query and a report type it produces a report, its cost, sources and
//! images. Everything else in this crate wraps that capability.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Source;

pub use http::HttpResearchEngine;

/// Raw output of one engine invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineReport {
    pub report: String,
    #[serde(default)]
    pub costs: f64,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("engine failure: {0}")]
    Failed(String),
}

#[async_trait]
pub trait ResearchEngine: Send + Sync {
    async fn conduct_research(
        &self,
        query: &str,
        report_type: &str,
        tone: Option<&str>,
    ) -> Result<EngineReport, EngineError>;
}
