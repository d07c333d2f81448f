//! Contact CRUD operations, always scoped to the owning account.

use sqlx::{Sqlite, SqliteExecutor, SqlitePool};
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{Contact, ContactFields};

const SELECT_CONTACT: &str = r#"
    SELECT id, user_id, full_name, phone_number, address,
           occupation_1, occupation_2, occupation_3, occupation_4,
           expected_wage, work_experience, daily_wage,
           created_at, updated_at
    FROM contacts
"#;

async fn insert_row<'e, E>(executor: E, id: &str, owner_id: &str, fields: &ContactFields) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO contacts (
            id, user_id, full_name, phone_number, address,
            occupation_1, occupation_2, occupation_3, occupation_4,
            expected_wage, work_experience, daily_wage
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .bind(&fields.full_name)
    .bind(&fields.phone_number)
    .bind(&fields.address)
    .bind(&fields.occupation_1)
    .bind(&fields.occupation_2)
    .bind(&fields.occupation_3)
    .bind(&fields.occupation_4)
    .bind(&fields.expected_wage)
    .bind(&fields.work_experience)
    .bind(&fields.daily_wage)
    .execute(executor)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Contact", id))?;

    Ok(())
}

/// Create a contact for `owner_id`.
pub async fn create_contact(
    pool: &SqlitePool,
    owner_id: &str,
    fields: &ContactFields,
) -> Result<Contact> {
    let id = Uuid::new_v4().to_string();
    insert_row(pool, &id, owner_id, fields).await?;
    get_contact(pool, owner_id, &id).await
}

/// Create many contacts in one transaction, preserving input order.
///
/// Nothing is inserted if any row fails.
pub async fn create_contacts(
    pool: &SqlitePool,
    owner_id: &str,
    batch: &[ContactFields],
) -> Result<Vec<Contact>> {
    let mut ids = Vec::with_capacity(batch.len());
    let mut tx = pool.begin().await?;

    for fields in batch {
        let id = Uuid::new_v4().to_string();
        insert_row(&mut *tx, &id, owner_id, fields).await?;
        ids.push(id);
    }

    tx.commit().await?;

    let mut created = Vec::with_capacity(ids.len());
    for id in &ids {
        created.push(get_contact(pool, owner_id, id).await?);
    }

    Ok(created)
}

/// Get one of the owner's contacts.
pub async fn get_contact(pool: &SqlitePool, owner_id: &str, id: &str) -> Result<Contact> {
    let query = format!("{SELECT_CONTACT} WHERE id = ? AND user_id = ?");
    sqlx::query_as::<_, Contact>(&query)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Contact",
            id: id.to_string(),
        })
}

/// List the owner's contacts ordered by name.
pub async fn list_contacts(pool: &SqlitePool, owner_id: &str) -> Result<Vec<Contact>> {
    let query = format!("{SELECT_CONTACT} WHERE user_id = ? ORDER BY lower(full_name), id");
    let contacts = sqlx::query_as::<_, Contact>(&query)
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

    Ok(contacts)
}

/// Replace every editable field of a contact.
pub async fn update_contact(
    pool: &SqlitePool,
    owner_id: &str,
    id: &str,
    fields: &ContactFields,
) -> Result<Contact> {
    let result = sqlx::query(
        r#"
        UPDATE contacts
        SET full_name = ?, phone_number = ?, address = ?,
            occupation_1 = ?, occupation_2 = ?, occupation_3 = ?, occupation_4 = ?,
            expected_wage = ?, work_experience = ?, daily_wage = ?,
            updated_at = datetime('now')
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&fields.full_name)
    .bind(&fields.phone_number)
    .bind(&fields.address)
    .bind(&fields.occupation_1)
    .bind(&fields.occupation_2)
    .bind(&fields.occupation_3)
    .bind(&fields.occupation_4)
    .bind(&fields.expected_wage)
    .bind(&fields.work_experience)
    .bind(&fields.daily_wage)
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Contact",
            id: id.to_string(),
        });
    }

    get_contact(pool, owner_id, id).await
}

/// Delete one of the owner's contacts.
pub async fn delete_contact(pool: &SqlitePool, owner_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM contacts
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Contact",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Delete all of the owner's contacts, returning how many went.
pub async fn delete_contacts_for_owner<'e>(
    executor: impl SqliteExecutor<'e>,
    owner_id: &str,
) -> Result<u64> {
    let result = sqlx::query("DELETE FROM contacts WHERE user_id = ?")
        .bind(owner_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Count the owner's contacts.
pub async fn count_contacts(pool: &SqlitePool, owner_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contacts WHERE user_id = ?")
        .bind(owner_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{account, Database};

    async fn test_db() -> (Database, String) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let account = account::create_account(db.pool(), "owner@example.com", "hash")
            .await
            .unwrap();
        (db, account.id)
    }

    fn worker(name: &str, phone: &str) -> ContactFields {
        ContactFields {
            address: "Ward 4, Guntur".to_string(),
            occupation_1: "Mason".to_string(),
            daily_wage: "700".to_string(),
            ..ContactFields::new(name, phone)
        }
    }

    #[tokio::test]
    async fn test_contact_crud() {
        let (db, owner) = test_db().await;

        let created = create_contact(db.pool(), &owner, &worker("Ravi", "9876543210"))
            .await
            .unwrap();
        assert_eq!(created.user_id, owner);
        assert_eq!(created.fields.occupation_1, "Mason");
        assert!(created.fields.occupation_2.is_empty());

        let fetched = get_contact(db.pool(), &owner, &created.id).await.unwrap();
        assert_eq!(fetched, created);

        let replacement = ContactFields::new("Ravi Teja", "9876500000");
        let updated = update_contact(db.pool(), &owner, &created.id, &replacement)
            .await
            .unwrap();
        assert_eq!(updated.fields, replacement);

        delete_contact(db.pool(), &owner, &created.id).await.unwrap();
        let result = get_contact(db.pool(), &owner, &created.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_contacts_are_owner_scoped() {
        let (db, owner) = test_db().await;
        let other = account::create_account(db.pool(), "other@example.com", "hash")
            .await
            .unwrap();

        let mine = create_contact(db.pool(), &owner, &worker("Ravi", "9876543210"))
            .await
            .unwrap();

        assert!(list_contacts(db.pool(), &other.id).await.unwrap().is_empty());
        assert!(get_contact(db.pool(), &other.id, &mine.id)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(delete_contact(db.pool(), &other.id, &mine.id)
            .await
            .unwrap_err()
            .is_not_found());
        assert_eq!(count_contacts(db.pool(), &owner).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_name() {
        let (db, owner) = test_db().await;
        for name in ["suresh", "Anil", "meena"] {
            create_contact(db.pool(), &owner, &worker(name, "9000000000"))
                .await
                .unwrap();
        }

        let names: Vec<String> = list_contacts(db.pool(), &owner)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.fields.full_name)
            .collect();
        assert_eq!(names, vec!["Anil", "meena", "suresh"]);
    }

    #[tokio::test]
    async fn test_batch_insert_preserves_order() {
        let (db, owner) = test_db().await;
        let batch = vec![
            worker("Zoya", "9000000001"),
            worker("Arjun", "9000000002"),
            worker("Kiran", "9000000003"),
        ];

        let created = create_contacts(db.pool(), &owner, &batch).await.unwrap();
        let names: Vec<&str> = created.iter().map(|c| c.fields.full_name.as_str()).collect();
        assert_eq!(names, vec!["Zoya", "Arjun", "Kiran"]);

        assert_eq!(delete_contacts_for_owner(db.pool(), &owner).await.unwrap(), 3);
        assert_eq!(count_contacts(db.pool(), &owner).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_insert_for_unknown_owner_is_atomic() {
        let (db, owner) = test_db().await;
        let batch = vec![worker("Zoya", "9000000001")];

        // Foreign key on user_id rejects the row.
        let result = create_contacts(db.pool(), "missing-owner", &batch).await;
        assert!(result.is_err());
        assert_eq!(count_contacts(db.pool(), &owner).await.unwrap(), 0);
    }
}
