//! Application state shared across handlers.

use std::sync::Arc;

use contact_store::{ChangeFeed, Contacts, StoreRegistry};
use database::Database;

use crate::config::Config;
use crate::storage::AvatarStorage;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Contact mutations.
    pub contacts: Contacts,
    /// Cached contact lists per signed-in owner.
    pub stores: Arc<StoreRegistry>,
    /// Avatar image storage.
    pub avatars: Arc<dyn AvatarStorage>,
    /// Server configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, avatars: Arc<dyn AvatarStorage>, config: Config) -> Self {
        let feed = ChangeFeed::default();
        let stores = Arc::new(StoreRegistry::new(Arc::new(db.clone()), feed.clone()));
        let contacts = Contacts::new(db.clone(), feed).with_stores(stores.clone());

        Self {
            db,
            contacts,
            stores,
            avatars,
            config: Arc::new(config),
        }
    }
}
