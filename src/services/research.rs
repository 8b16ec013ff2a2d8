//! Research orchestration: sanitize, validate, consult the cache, invoke the
//! engine on a miss, persist the outcome and update the cache.

use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::AppCore;
use crate::engine::EngineReport;
use crate::models::{ResearchFailure, ResearchRequest, ResearchResult, StoredRecord};
use crate::security::{sanitizer, validator};

/// Launch a research run in the background. Returns immediately; progress is
/// observable via the task registry, the outcome via the result store.
pub fn spawn_research(core: Arc<AppCore>, request: ResearchRequest, request_id: String) {
    core.registry.register(&request_id);

    tokio::spawn(async move {
        info!(request_id, "starting research task");
        let outcome = run_research(&core, request, &request_id).await;
        let error = match &outcome {
            Ok(result) => {
                info!(request_id, report_id = result.report_id, cached = result.cached, "research task completed");
                None
            }
            Err(err) => {
                error!(request_id, error = err, "research task failed");
                Some(err.clone())
            }
        };
        // The outcome is already durable; the registry entry can go.
        core.registry.finish(&request_id, error);
    });
}

/// Run one research request to a persisted outcome.
pub async fn run_research(
    core: &AppCore,
    request: ResearchRequest,
    request_id: &str,
) -> Result<ResearchResult, String> {
    let raw = serde_json::to_value(&request).map_err(|err| err.to_string())?;
    let sanitized = sanitizer::sanitize(&raw);

    let query = field(&sanitized, "query");
    let mut report_type = field(&sanitized, "report_type");
    let mut tone = sanitized
        .get("tone")
        .and_then(Value::as_str)
        .map(str::to_string);

    if !validator::validate_query(&query) {
        let message = "Invalid query - contains potentially harmful content".to_string();
        persist_failure(core, &message, &query, &report_type, request_id);
        return Err(message);
    }

    // Soft validation: downstream callers get a usable value either way.
    if !validator::validate_report_type(&report_type) {
        warn!(report_type, "invalid report type, defaulting to research_report");
        report_type = "research_report".to_string();
    }
    if let Some(value) = tone.take() {
        if validator::validate_tone(&value) {
            tone = Some(value);
        } else {
            warn!(tone = value, "invalid tone, ignoring");
        }
    }

    let cache_fields = json!({
        "query": query,
        "report_type": report_type,
        "tone": tone,
    });

    if let Some(hit) = core.cache.get(&cache_fields) {
        match serde_json::from_value::<EngineReport>(hit) {
            Ok(report) => {
                info!(request_id, query, "using cached result");
                let result = build_result(report, &query, &report_type, tone, request_id, 0.0, true);
                persist_result(core, &result, None);
                return Ok(result);
            }
            Err(err) => {
                warn!(%err, "discarding unreadable cache entry");
                core.cache.invalidate(&cache_fields);
            }
        }
    }

    info!(request_id, query, report_type, "conducting research");
    let started = Instant::now();

    match core
        .engine
        .conduct_research(&query, &report_type, tone.as_deref())
        .await
    {
        Ok(report) => {
            let elapsed = started.elapsed().as_secs_f64();
            info!(request_id, elapsed_secs = format!("{elapsed:.2}"), "research engine finished");

            let result = build_result(
                report.clone(),
                &query,
                &report_type,
                tone,
                request_id,
                elapsed,
                false,
            );
            // Cache only after the record is safely on disk.
            persist_result(core, &result, Some((&cache_fields, &report)));
            Ok(result)
        }
        Err(err) => {
            let message = err.to_string();
            persist_failure(core, &message, &query, &report_type, request_id);
            Err(message)
        }
    }
}

fn field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn build_result(
    report: EngineReport,
    query: &str,
    report_type: &str,
    tone: Option<String>,
    request_id: &str,
    elapsed_secs: f64,
    cached: bool,
) -> ResearchResult {
    ResearchResult {
        query: query.to_string(),
        report_type: report_type.to_string(),
        tone,
        report: report.report,
        costs: report.costs,
        sources: report.sources,
        images: report.images,
        elapsed_secs,
        cached,
        completed_at: Utc::now(),
        report_id: Uuid::new_v4().to_string(),
        request_id: request_id.to_string(),
    }
}

fn persist_result(core: &AppCore, result: &ResearchResult, cache_write: Option<(&Value, &EngineReport)>) {
    match core.store.save(&StoredRecord::Completed(result.clone())) {
        Ok(path) => {
            debug!(path = %path.display(), "research record persisted");
            if let Some((cache_fields, report)) = cache_write {
                match serde_json::to_value(report) {
                    Ok(value) => {
                        core.cache.set(cache_fields, &value, None);
                    }
                    Err(err) => warn!(%err, "failed to serialize result for caching"),
                }
            }
        }
        Err(err) => error!(%err, "failed to persist research result"),
    }
}

fn persist_failure(core: &AppCore, message: &str, query: &str, report_type: &str, request_id: &str) {
    let failure = ResearchFailure::new(
        message.to_string(),
        query.to_string(),
        report_type.to_string(),
        request_id.to_string(),
    );
    if let Err(err) = core.store.save(&StoredRecord::Failed(failure)) {
        error!(%err, "failed to persist research failure");
    }
}
