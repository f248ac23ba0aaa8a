pub mod password;
pub mod permissions;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::database::models::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: i64,
    pub role: Role,
    pub token_type: TokenKind,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user: &User, token_type: TokenKind, now: DateTime<Utc>) -> Self {
        let security = &config::config().security;
        let lifetime = match token_type {
            TokenKind::Access => Duration::minutes(security.access_token_minutes),
            TokenKind::Refresh => Duration::hours(security.refresh_token_hours),
        };

        Self {
            sub: user.id,
            role: user.role,
            token_type,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token generation failed: {0}")]
    Signing(String),
    #[error("Token is invalid or expired")]
    Invalid,
    #[error("Token has wrong type (expected {expected:?})")]
    WrongType { expected: TokenKind },
    #[error("Token has been revoked")]
    Revoked,
}

/// Access/refresh pair returned by the token endpoints
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub fn generate_jwt(claims: &Claims) -> Result<String, TokenError> {
    let secret = &config::config().security.jwt_secret;
    encode_with(claims, secret)
}

pub fn issue_pair(user: &User) -> Result<TokenPair, TokenError> {
    let now = Utc::now();
    Ok(TokenPair {
        access: generate_jwt(&Claims::new(user, TokenKind::Access, now))?,
        refresh: generate_jwt(&Claims::new(user, TokenKind::Refresh, now))?,
    })
}

/// Validate signature, expiry and token type
pub fn validate_jwt(token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
    let secret = &config::config().security.jwt_secret;
    decode_with(token, secret, expected)
}

fn encode_with(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::Signing("JWT secret not configured".to_string()));
    }
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key).map_err(|e| TokenError::Signing(e.to_string()))
}

fn decode_with(token: &str, secret: &str, expected: TokenKind) -> Result<Claims, TokenError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let claims = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| {
            tracing::debug!("Rejected JWT: {}", e);
            TokenError::Invalid
        })?
        .claims;

    if claims.token_type != expected {
        return Err(TokenError::WrongType { expected });
    }
    Ok(claims)
}
