use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::tokens;
use crate::api::state::AppState;

const API_KEY_HEADER: &str = "x-api-key";

/// Credential check for every endpoint except the liveness probe and the
/// token exchange. Accepts a configured API key (`X-API-Key` or bearer) or a
/// bearer JWT issued by `POST /token`.
pub async fn auth_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if path == "/health" || path == "/token" {
        return next.run(req).await;
    }

    if let Some(key) = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        if state.api_keys.validate_key(key.trim()).is_some() {
            return next.run(req).await;
        }
        return unauthorized("Invalid API Key");
    }

    if let Some(token) = extract_bearer(req.headers().get(header::AUTHORIZATION)) {
        if state.api_keys.validate_key(&token).is_some() {
            return next.run(req).await;
        }
        if tokens::verify_token(&token, state.config.auth.jwt_secret.as_bytes()).is_some() {
            return next.run(req).await;
        }
        return unauthorized("Invalid or expired token");
    }

    unauthorized("API credential required")
}

fn extract_bearer(header: Option<&HeaderValue>) -> Option<String> {
    let value = header?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(|token| token.trim().to_string())
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))],
        Json(json!({"success": false, "message": message})),
    )
        .into_response()
}
