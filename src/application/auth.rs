//! Admin authentication: single-table credential check plus a signed token.
//!
//! Passwords are verified against Argon2 PHC strings stored on the
//! `admin_users` row; successful logins are stamped and answered with a
//! short-lived JWT that the HTTP layer carries in an HTTP-only cookie (with
//! an `Authorization: Bearer` fallback).

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::application::repos::{AdminUsersRepo, RepoError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("token missing")]
    TokenMissing,
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("token lacks admin claim")]
    NotAdmin,
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("credential hash is malformed: {0}")]
    BadHash(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Claims carried by the admin token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Username.
    pub sub: String,
    /// Admin user id.
    pub uid: i64,
    /// Always true for tokens issued here; checked on every request.
    pub admin: bool,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// The authenticated identity attached to admin requests.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub id: i64,
    pub username: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn AdminUsersRepo>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(users: Arc<dyn AdminUsersRepo>, secret: &str, token_ttl: Duration) -> Self {
        Self {
            users,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl,
        }
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Verify credentials and issue a token. Unknown users and wrong
    /// passwords are indistinguishable to the caller.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(String, AdminIdentity), AuthError> {
        let Some(user) = self.users.find_active_by_username(username).await? else {
            warn!(target = "kalem::auth", username, "login for unknown or inactive user");
            return Err(AuthError::InvalidCredentials);
        };

        let parsed =
            PasswordHash::new(&user.password_hash).map_err(|err| AuthError::BadHash(err.to_string()))?;
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_err()
        {
            warn!(target = "kalem::auth", username, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        self.users.record_login(user.id).await?;

        let token = self.issue_token(user.id, &user.username)?;
        info!(target = "kalem::auth", username, "admin login");
        Ok((
            token,
            AdminIdentity {
                id: user.id,
                username: user.username,
            },
        ))
    }

    pub fn issue_token(&self, uid: i64, username: &str) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc();
        let claims = AdminClaims {
            sub: username.to_string(),
            uid,
            admin: true,
            iat: now.unix_timestamp(),
            exp: (now + self.token_ttl).unix_timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Signing(err.to_string()))
    }

    /// Decode and validate a token, requiring the admin claim.
    pub fn verify_token(&self, token: &str) -> Result<AdminIdentity, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = jsonwebtoken::decode::<AdminClaims>(token, &self.decoding_key, &validation)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            })?;

        if !data.claims.admin {
            return Err(AuthError::NotAdmin);
        }

        Ok(AdminIdentity {
            id: data.claims.uid,
            username: data.claims.sub,
        })
    }
}

/// Hash a password for provisioning an admin user (used by the CLI).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::BadHash(err.to_string()))
}
