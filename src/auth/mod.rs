pub mod ownership;
pub mod password;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::MAX_JWT_EXPIRY_HOURS;

pub use ownership::{authorize, Owned};
pub use password::{hash_password, verify_password};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingCredential,

    #[error("Authorization header must use Bearer token format")]
    MalformedCredential,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has expired")]
    Expired,

    #[error("Account is no longer active")]
    AccountInactive,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(account_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: account_id,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Authenticated caller context, inserted into request extensions by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub account_id: Uuid,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self { account_id: claims.sub }
    }
}

/// Turns a bearer token into a caller identity. Handlers only ever see `AuthUser`.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError>;
}

/// Issues and verifies HS256 tokens signed with the configured secret.
pub struct JwtAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtAuthority {
    pub fn new(secret: &str, expiry_hours: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(expiry_hours.min(MAX_JWT_EXPIRY_HOURS) as i64),
        }
    }

    pub fn expires_in_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, account_id: Uuid) -> Result<String, AuthError> {
        self.encode_claims(&Claims::new(account_id, self.ttl))
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }
}

#[async_trait]
impl TokenVerifier for JwtAuthority {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        self.decode(token).map(AuthUser::from)
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingCredential)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedCredential)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MalformedCredential);
    }
    Ok(token)
}
