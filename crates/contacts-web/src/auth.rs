//! Password hashing, bearer tokens and the authenticated-user extractor.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use database::{session, Account, Session};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Hash a password with argon2id on the blocking pool.
pub async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("password hashing task failed: {e}")))?
}

/// Check a password against a stored PHC string.
///
/// A malformed stored hash never verifies.
pub async fn verify_password(password: String, stored_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || match PasswordHash::new(&stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is unreadable: {}", e);
            false
        }
    })
    .await
    .map_err(|e| ApiError::Internal(format!("password check task failed: {e}")))
}

/// A fresh bearer token (32 random bytes, hex) and its storage digest.
pub fn new_token() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let digest = hash_token(&token);
    (token, digest)
}

/// Digest under which a token is stored.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Bearer token from the `Authorization` header, or from an
/// `access_token` query parameter for clients that cannot set headers
/// (e.g. `EventSource`).
fn request_token(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    from_header.or_else(|| {
        parts.uri.query().and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "access_token")
                .map(|(_, value)| value.into_owned())
        })
    })
}

/// The account behind a valid, unexpired bearer session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub account: Account,
    pub session: Session,
}

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.account.id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = request_token(parts)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Please sign in to continue".to_string()))?;

        let (session, account) = session::find_session_account(state.db.pool(), &hash_token(&token))
            .await?
            .ok_or_else(|| {
                ApiError::Unauthorized("Your session has expired. Please sign in again".to_string())
            })?;

        Ok(Self { account, session })
    }
}
