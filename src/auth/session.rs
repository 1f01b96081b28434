use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Role;

/// Signed session payload
///
/// `role` has no default: a token without it fails to decode and is treated
/// as invalid rather than downgraded to some fallback role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, carried as a string per RFC 7519
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, SessionError> {
        match self.sub.parse::<i64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(SessionError::Invalid(format!("malformed subject '{}'", self.sub))),
        }
    }
}

/// Authenticated requester, built once per request from verified claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl TryFrom<Claims> for AuthUser {
    type Error = SessionError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            id: claims.user_id()?,
            email: claims.email,
            role: claims.role,
        })
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session expired")]
    Expired,

    #[error("Session invalid: {0}")]
    Invalid(String),

    #[error("Session signing failed: {0}")]
    Signing(String),
}

/// Longest session lifetime the issuer will sign, one year
pub const MAX_EXPIRY_HOURS: u64 = 24 * 365;

/// Issues and resolves HS256 session tokens with a process-wide key
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionIssuer {
    /// Lifetimes above [`MAX_EXPIRY_HOURS`] are clamped to it
    pub fn new(secret: &str, expiry_hours: u64) -> Self {
        let hours = i64::try_from(expiry_hours.min(MAX_EXPIRY_HOURS)).unwrap_or(i64::MAX);
        Self::with_ttl(secret, Duration::hours(hours))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        let validation = Validation::new(Algorithm::HS256);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Sign a token for the given user
    pub fn issue(&self, id: i64, email: &str, role: Role) -> Result<String, SessionError> {
        let now = Utc::now();
        let claims = Claims {
            sub: id.to_string(),
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Signing(e.to_string()))?;

        tracing::debug!("Issued session for user {} ({})", id, role);

        Ok(token)
    }

    pub fn resolve(&self, token: &str) -> Result<Claims, SessionError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Invalid(e.to_string()),
            })?;

        claims.user_id()?;
        Ok(claims)
    }
}
