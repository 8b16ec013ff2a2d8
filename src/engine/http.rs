//! HTTP client for a remote research engine service.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{EngineError, EngineReport, ResearchEngine};

pub struct HttpResearchEngine {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpResearchEngine {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[derive(Serialize)]
struct EngineRequest<'a> {
    query: &'a str,
    report_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tone: Option<&'a str>,
}

#[async_trait]
impl ResearchEngine for HttpResearchEngine {
    async fn conduct_research(
        &self,
        query: &str,
        report_type: &str,
        tone: Option<&str>,
    ) -> Result<EngineReport, EngineError> {
        let mut request = self
            .client
            .post(format!("{}/report", self.base_url))
            .json(&EngineRequest {
                query,
                report_type,
                tone,
            });

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(EngineError::Failed(format!(
                "engine returned status {}",
                response.status()
            )));
        }

        Ok(response.json::<EngineReport>().await?)
    }
}
