//! Bearer token issuing and verification.

use anyhow::Result;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::sha256_hex;
use crate::config::AuthConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Issue an HS256 access token for the given subject, returning the token
/// and its expiry time.
pub fn create_access_token(
    username: &str,
    auth: &AuthConfig,
) -> Result<(String, DateTime<Utc>)> {
    let expires_at = Utc::now() + chrono::Duration::from_std(auth.token_expiry)?;
    let claims = Claims {
        sub: username.to_string(),
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )?;

    Ok((token, expires_at))
}

/// Verify a token and return its subject, or `None` when invalid or expired.
pub fn verify_token(token: &str, secret: &[u8]) -> Option<String> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .ok()
        .map(|data| data.claims.sub)
}

/// Check a username/password pair against the configured admin credential.
pub fn verify_credentials(auth: &AuthConfig, username: &str, password: &str) -> bool {
    username == auth.admin_username && sha256_hex(password) == auth.admin_password_hash
}
