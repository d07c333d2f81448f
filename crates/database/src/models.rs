//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A sign-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Account UUID, shared with the profile row.
    pub id: String,
    /// Lower-cased email address.
    pub email: String,
    /// Argon2id PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the account was created.
    pub created_at: String,
}

/// A bearer session belonging to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Hex sha256 digest of the bearer token.
    pub token_hash: String,
    /// Owning account.
    pub account_id: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Expiry timestamp (`YYYY-MM-DD HH:MM:SS`, UTC).
    pub expires_at: String,
}

/// Per-user display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    /// Same id as the account.
    pub id: String,
    /// Email captured when the profile was created.
    pub email: String,
    /// Display name, empty until the user sets one.
    pub full_name: String,
    /// Public avatar URL, empty when no avatar was uploaded.
    pub avatar_url: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// The editable fields of a contact.
///
/// Optional fields use the empty string for "absent". This is also the shape
/// of a parsed import row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct ContactFields {
    pub full_name: String,
    pub phone_number: String,
    pub address: String,
    pub occupation_1: String,
    pub occupation_2: String,
    pub occupation_3: String,
    pub occupation_4: String,
    pub expected_wage: String,
    pub work_experience: String,
    pub daily_wage: String,
}

impl ContactFields {
    /// Build fields with only the required values set.
    pub fn new(full_name: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            phone_number: phone_number.into(),
            ..Default::default()
        }
    }

    /// Whether both required fields carry a value.
    pub fn has_required(&self) -> bool {
        !self.full_name.is_empty() && !self.phone_number.is_empty()
    }
}

/// A stored worker contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: String,
    /// Owning account.
    pub user_id: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub fields: ContactFields,
    pub created_at: String,
    pub updated_at: String,
}
