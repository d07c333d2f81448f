//! Bearer session storage.
//!
//! Tokens are never stored; callers hash them first and pass the digest.

use std::collections::HashSet;
use std::time::Duration;

use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{Account, Session};

/// Store a new session that expires after `ttl`.
pub async fn create_session(
    pool: &SqlitePool,
    account_id: &str,
    token_hash: &str,
    ttl: Duration,
) -> Result<Session> {
    let modifier = format!("+{} seconds", ttl.as_secs());

    sqlx::query(
        r#"
        INSERT INTO sessions (token_hash, account_id, expires_at)
        VALUES (?, ?, datetime('now', ?))
        "#,
    )
    .bind(token_hash)
    .bind(account_id)
    .bind(&modifier)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Session", account_id))?;

    let session = sqlx::query_as::<_, Session>(
        r#"
        SELECT token_hash, account_id, created_at, expires_at
        FROM sessions
        WHERE token_hash = ?
        "#,
    )
    .bind(token_hash)
    .fetch_one(pool)
    .await?;

    Ok(session)
}

/// Resolve a token digest to its session and account.
///
/// Expired sessions never match.
pub async fn find_session_account(
    pool: &SqlitePool,
    token_hash: &str,
) -> Result<Option<(Session, Account)>> {
    let session = sqlx::query_as::<_, Session>(
        r#"
        SELECT token_hash, account_id, created_at, expires_at
        FROM sessions
        WHERE token_hash = ? AND expires_at > datetime('now')
        "#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;

    let Some(session) = session else {
        return Ok(None);
    };

    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, email, password_hash, created_at
        FROM accounts
        WHERE id = ?
        "#,
    )
    .bind(&session.account_id)
    .fetch_optional(pool)
    .await?;

    Ok(account.map(|account| (session, account)))
}

/// Delete a single session. Returns true if one existed.
pub async fn delete_session(pool: &SqlitePool, token_hash: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(token_hash)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete every session of an account.
pub async fn delete_sessions_for_account<'e>(
    executor: impl SqliteExecutor<'e>,
    account_id: &str,
) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE account_id = ?")
        .bind(account_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Drop sessions whose expiry has passed.
pub async fn delete_expired_sessions(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= datetime('now')")
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Accounts holding at least one unexpired session.
pub async fn accounts_with_live_sessions(pool: &SqlitePool) -> Result<HashSet<String>> {
    let ids: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT account_id FROM sessions WHERE expires_at > datetime('now')",
    )
    .fetch_all(pool)
    .await?;

    Ok(ids.into_iter().collect())
}
