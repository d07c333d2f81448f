//! SQLite persistence layer for the contact manager.
//!
//! Accounts, sessions, profiles and worker contacts live in one SQLite
//! file. Queries are free functions over a [`sqlx::SqlitePool`], grouped by
//! table, and every contact query takes the owning account id.
//!
//! ```no_run
//! use database::{account, contact, ContactFields, Database};
//!
//! # async fn run() -> database::Result<()> {
//!     let db = Database::connect("sqlite:contacts.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let owner = account::create_account(db.pool(), "asha@example.com", "$argon2id$...").await?;
//!     contact::create_contact(
//!         db.pool(),
//!         &owner.id,
//!         &ContactFields::new("Ravi Kumar", "9876543210"),
//!     )
//!     .await?;
//!
//!     Ok(())
//! # }
//! ```

pub mod account;
pub mod contact;
pub mod error;
pub mod models;
pub mod profile;
pub mod session;
pub mod validation;

pub use account::PurgeSummary;
pub use error::{DatabaseError, Result};
pub use models::{Account, Contact, ContactFields, Profile, Session};
pub use profile::ProfileField;
pub use validation::{FieldError, ValidationError};

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// Handle to the SQLite pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    const POOL_SIZE: u32 = 10;
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

    /// Open `url` (`sqlite:contacts.db?mode=rwc`, or `sqlite::memory:` in
    /// tests) with foreign keys enforced. Missing files are created.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::POOL_SIZE).await
    }

    /// Like [`Database::connect`] with an explicit connection limit.
    pub async fn connect_with_pool_size(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        info!(url, max_connections, "Opened contacts database");
        Ok(Self { pool })
    }

    /// Bring the schema up to date. Safe to call on every start.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Schema migrations applied");
        Ok(())
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for checked-out connections and close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
