//! Display name and avatar for each account.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DatabaseError, Result};
use crate::models::Profile;

/// A profile column that can be written on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    FullName,
    AvatarUrl,
}

impl ProfileField {
    fn column(self) -> &'static str {
        match self {
            ProfileField::FullName => "full_name",
            ProfileField::AvatarUrl => "avatar_url",
        }
    }
}

fn missing(id: &str) -> DatabaseError {
    DatabaseError::NotFound {
        entity: "Profile",
        id: id.to_string(),
    }
}

pub async fn get_profile(pool: &SqlitePool, id: &str) -> Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(
        "SELECT id, email, full_name, avatar_url, updated_at FROM profiles WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(profile)
}

/// Return the profile for `id`, inserting an empty one first if none exists.
///
/// An existing row is never modified, whatever `email` says.
pub async fn ensure_profile(pool: &SqlitePool, id: &str, email: &str) -> Result<Profile> {
    if let Some(profile) = get_profile(pool, id).await? {
        return Ok(profile);
    }

    let created = sqlx::query("INSERT INTO profiles (id, email) VALUES (?, ?) ON CONFLICT(id) DO NOTHING")
        .bind(id)
        .bind(email)
        .execute(pool)
        .await?
        .rows_affected()
        > 0;
    if created {
        info!(profile = %id, "Created profile");
    }

    get_profile(pool, id).await?.ok_or_else(|| missing(id))
}

/// Overwrite one column and bump `updated_at`.
pub async fn set_profile_field(
    pool: &SqlitePool,
    id: &str,
    field: ProfileField,
    value: &str,
) -> Result<()> {
    // Only ProfileField names reach the column slot.
    let sql = format!(
        "UPDATE profiles SET {} = ?, updated_at = datetime('now') WHERE id = ?",
        field.column()
    );

    let updated = sqlx::query(&sql)
        .bind(value)
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(missing(id));
    }
    Ok(())
}
