/*!
 * # Bearer-token auth and farm roles
 *
 * Token issuance belongs to the identity service in front of this API; this
 * module only validates the HS256 bearer tokens it hands out. Every request is
 * resolved once into a [`Caller`] that carries the caller's role on a farm, and
 * object-level decisions go through [`policy::authorize`].
 */

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::AppConfig;
use crate::errors::ServiceError;

mod caller;
pub mod policy;

pub use caller::{Caller, CallerRole};
pub use policy::{authorize, Action, FarmRef, ResourceKind};

/// Accepted `Authorization` schemes.
const AUTH_SCHEMES: [&str; 2] = ["Bearer ", "JWT "];

/// Claims carried by a FarmSense bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,              // Subject (user ID)
    pub username: Option<String>, // Display name at issue time
    pub iss: String,              // Issuer
    pub iat: i64,                 // Issued at time
    pub exp: i64,                 // Expiration time
}

impl Claims {
    pub fn user_id(&self) -> Result<i32, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Signing key and issuer used to check tokens
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub token_ttl: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, jwt_issuer: String, token_ttl: Duration) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            token_ttl,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.jwt_issuer.clone(),
            Duration::from_secs(24 * 60 * 60),
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication credentials were not provided.")]
    MissingAuth,
    #[error("Given token not valid for any token type")]
    InvalidToken,
    #[error("Token has expired")]
    TokenExpired,
    #[error("User not found")]
    UnknownUser,
    #[error("Token could not be issued: {0}")]
    Issue(String),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Issue(msg) => ServiceError::InternalError(msg),
            other => ServiceError::Unauthorized(other.to_string()),
        }
    }
}

/// Validates bearer tokens and, for tooling, issues them.
#[derive(Debug, Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Issue a signed token for `user_id`.
    pub fn issue_token(&self, user_id: i32, username: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(self.config.token_ttl)
            .map_err(|_| AuthError::Issue("Invalid token duration".to_string()))?;
        let claims = Claims {
            sub: user_id.to_string(),
            username: Some(username.to_string()),
            iss: self.config.jwt_issuer.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Issue(e.to_string()))
    }

    /// Decodes `token`, checking signature, expiry and issuer
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("token rejected: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })
    }

    /// Pull the token out of an `Authorization` header value.
    pub fn token_from_header(value: &str) -> Option<&str> {
        AUTH_SCHEMES.iter().find_map(|scheme| {
            value
                .strip_prefix(scheme)
                .map(str::trim)
                .filter(|token| !token.is_empty())
        })
    }
}
