//! Account CRUD operations.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::{contact, session};
use crate::models::Account;

/// Rows removed by [`purge_account`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    pub contacts: u64,
    pub profiles: u64,
    pub sessions: u64,
}

/// Create a new account with a fresh id.
///
/// The email is stored lower-cased; a duplicate email is `AlreadyExists`.
pub async fn create_account(pool: &SqlitePool, email: &str, password_hash: &str) -> Result<Account> {
    let id = Uuid::new_v4().to_string();
    let email = email.trim().to_lowercase();

    sqlx::query(
        r#"
        INSERT INTO accounts (id, email, password_hash)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&email)
    .bind(password_hash)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Account", &email))?;

    get_account(pool, &id).await
}

/// Get an account by ID.
pub async fn get_account(pool: &SqlitePool, id: &str) -> Result<Account> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, email, password_hash, created_at
        FROM accounts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Account",
        id: id.to_string(),
    })
}

/// Get an account by email (case-insensitive).
pub async fn get_account_by_email(pool: &SqlitePool, email: &str) -> Result<Account> {
    let email = email.trim().to_lowercase();
    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, email, password_hash, created_at
        FROM accounts
        WHERE email = ?
        "#,
    )
    .bind(&email)
    .fetch_optional(pool)
    .await?;

    account.ok_or(DatabaseError::NotFound {
        entity: "Account",
        id: email,
    })
}

/// Delete an account row only. Dependent rows go with it via cascade.
pub async fn delete_account(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM accounts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Account",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Remove an account and everything it owns in a single transaction.
///
/// Either every row is gone afterwards or nothing changed.
pub async fn purge_account(pool: &SqlitePool, id: &str) -> Result<PurgeSummary> {
    let mut tx = pool.begin().await?;

    let contacts = contact::delete_contacts_for_owner(&mut *tx, id).await?;

    let profiles = sqlx::query("DELETE FROM profiles WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let sessions = session::delete_sessions_for_account(&mut *tx, id).await?;

    let accounts = sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if accounts == 0 {
        // Dropping the transaction rolls it back.
        return Err(DatabaseError::NotFound {
            entity: "Account",
            id: id.to_string(),
        });
    }

    tx.commit().await?;

    tracing::info!(account = %id, contacts, profiles, sessions, "Account purged");

    Ok(PurgeSummary {
        contacts,
        profiles,
        sessions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContactFields;
    use crate::{contact, profile, Database};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_create_and_lookup_account() {
        let db = test_db().await;

        let account = create_account(db.pool(), " Ravi@Example.com ", "hash")
            .await
            .unwrap();
        assert_eq!(account.email, "ravi@example.com");

        let by_email = get_account_by_email(db.pool(), "RAVI@example.com")
            .await
            .unwrap();
        assert_eq!(by_email.id, account.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = test_db().await;
        create_account(db.pool(), "a@b.co", "hash").await.unwrap();

        let result = create_account(db.pool(), "A@B.co", "other").await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_purge_account_removes_everything() {
        let db = test_db().await;
        let account = create_account(db.pool(), "a@b.co", "hash").await.unwrap();
        profile::ensure_profile(db.pool(), &account.id, &account.email)
            .await
            .unwrap();
        contact::create_contact(
            db.pool(),
            &account.id,
            &ContactFields::new("Ravi Kumar", "9876543210"),
        )
        .await
        .unwrap();

        let summary = purge_account(db.pool(), &account.id).await.unwrap();
        assert_eq!(summary.contacts, 1);
        assert_eq!(summary.profiles, 1);

        assert!(get_account(db.pool(), &account.id)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(profile::get_profile(db.pool(), &account.id)
            .await
            .unwrap()
            .is_none());
        assert_eq!(contact::count_contacts(db.pool(), &account.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_missing_account() {
        let db = test_db().await;
        let result = purge_account(db.pool(), "nope").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
