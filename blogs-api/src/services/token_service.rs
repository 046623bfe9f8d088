//! Access-token signing/verification and opaque refresh tokens.
//!
//! Access tokens are HS256 JWTs carrying `iss`, `sub`, `iat` and `exp`.
//! Refresh tokens are 32 random bytes, hex encoded; only their SHA-256 digest
//! is persisted.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use blogs_shared::errors::AppError;
use blogs_shared::types::auth::{Claims, TOKEN_ISSUER};

const REFRESH_TOKEN_BYTES: usize = 32;

/// Outcome of checking an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessTokenStatus {
    Valid(Claims),
    /// Signature and issuer check out but the token is past `exp`.
    Expired(Claims),
    Malformed(String),
}

pub fn issue_access_token(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, AppError> {
    issue_access_token_at(user_id, secret, ttl, Utc::now())
}

pub fn issue_access_token_at(
    user_id: Uuid,
    secret: &str,
    ttl: Duration,
    issued_at: DateTime<Utc>,
) -> Result<String, AppError> {
    let claims = Claims::new(user_id, issued_at, ttl);
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))
}

pub fn verify_access_token(token: &str, secret: &str) -> AccessTokenStatus {
    verify_access_token_at(token, secret, Utc::now())
}

/// Verifies signature, algorithm, issuer and required claims, then judges
/// expiry against `now` with zero leeway.
pub fn verify_access_token_at(token: &str, secret: &str, now: DateTime<Utc>) -> AccessTokenStatus {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = false;
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation.set_required_spec_claims(&["exp", "sub", "iss"]);

    match decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation) {
        Ok(data) if data.claims.is_expired_at(now) => AccessTokenStatus::Expired(data.claims),
        Ok(data) => AccessTokenStatus::Valid(data.claims),
        Err(e) => AccessTokenStatus::Malformed(e.to_string()),
    }
}

/// 32 bytes from the OS generator, hex encoded.
pub fn issue_refresh_token() -> Result<String, AppError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AppError::internal(format!("refresh token generation failed: {e}")))?;
    Ok(hex::encode(bytes))
}

pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
