pub mod auth;
pub mod research;
pub mod response;
pub mod state;
pub mod tasks;

pub use response::ApiResponse;
pub use state::AppState;

use axum::{
    Extension, Json, Router, middleware,
    http::{HeaderName, Method, header},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

use crate::auth::auth_middleware;
use crate::middleware::{RateLimiter, rate_limit_middleware, security_headers_middleware};

// GET /health
async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
    }))
}

/// Build the full application router with middleware applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
        ]);

    let rate_limiter = RateLimiter::new(state.config.rate_limit_per_minute);

    Router::new()
        .route("/health", get(health))
        .route("/token", post(auth::issue_token))
        .route(
            "/research",
            post(research::submit_research).get(research::list_research),
        )
        .route(
            "/research/{report_id}",
            get(research::get_research).delete(research::delete_research),
        )
        .route("/status/{request_id}", get(research::get_status))
        .route("/tasks", get(tasks::list_tasks))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(middleware::from_fn(rate_limit_middleware))
        .layer(Extension(rate_limiter))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(cors)
        .with_state(state)
}
