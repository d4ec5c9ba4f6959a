//! # JWT Session Tokens
//!
//! Session tokens are HS256-signed JWTs carrying only `user_id` and `exp`.
//! Verification fails closed: any decoding, signature, algorithm or expiry
//! problem is an error.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Owner of the session (users.id)
    pub user_id: String,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,
}

/// Sign a session token for `user_id` that expires `ttl` from now.
pub fn generate_jwt(user_id: &str, secret: &[u8], ttl: Duration) -> Result<String> {
    let exp = Utc::now() + ttl;

    let claims = Claims {
        user_id: user_id.to_string(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| Error::TokenSign(e.to_string()))
}

/// Verify a session token and return the user id and expiration.
pub fn verify_jwt(token: &str, secret: &[u8]) -> Result<(String, DateTime<Utc>)> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => Error::TokenExpired,
            _ => Error::TokenInvalid(e.to_string()),
        })?;

    let Claims { user_id, exp } = token_data.claims;
    if user_id.trim().is_empty() {
        return Err(Error::TokenInvalid("missing user_id claim".to_string()));
    }

    let expiration = DateTime::<Utc>::from_timestamp(exp, 0)
        .ok_or_else(|| Error::TokenInvalid("exp out of range".to_string()))?;

    Ok((user_id, expiration))
}
