use axum::{Json, extract::State};
use tracing::info;

use crate::api::state::AppState;
use crate::auth::tokens;
use crate::error::ApiError;
use crate::models::{AuthRequest, TokenResponse};

// POST /token
pub async fn issue_token(
    State(state): State<AppState>,
    Json(request): Json<AuthRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    if !tokens::verify_credentials(&state.config.auth, &request.username, &request.password) {
        return Err(ApiError::Unauthorized(
            "Incorrect username or password".to_string(),
        ));
    }

    let (access_token, expires_at) = tokens::create_access_token(&request.username, &state.config.auth)
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    info!(username = request.username, "issued access token");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_at,
    }))
}
