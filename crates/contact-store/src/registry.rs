//! Container of per-owner contact stores.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::Result;
use crate::feed::{ChangeEvent, ChangeFeed};
use crate::store::{spawn_sync, ContactSource, ContactStore};

struct SyncedStore {
    store: Arc<ContactStore>,
    sync: JoinHandle<()>,
}

impl Drop for SyncedStore {
    fn drop(&mut self) {
        self.sync.abort();
    }
}

/// Owns one synced [`ContactStore`] per active owner.
///
/// Stores are created on first use and stay subscribed to the feed until
/// [`evict`](Self::evict)ed or dropped by [`retain`](Self::retain).
pub struct StoreRegistry {
    source: Arc<dyn ContactSource>,
    feed: ChangeFeed,
    stores: RwLock<HashMap<String, SyncedStore>>,
}

impl StoreRegistry {
    pub fn new(source: Arc<dyn ContactSource>, feed: ChangeFeed) -> Self {
        Self {
            source,
            feed,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// The owner's store, created, subscribed and loaded on first call.
    pub async fn store_for(&self, owner_id: &str) -> Result<Arc<ContactStore>> {
        let existing = {
            let stores = self.stores.read().await;
            stores.get(owner_id).map(|entry| entry.store.clone())
        };

        let store = match existing {
            Some(store) => store,
            None => {
                let mut stores = self.stores.write().await;
                let entry = stores.entry(owner_id.to_string()).or_insert_with(|| {
                    let store = Arc::new(ContactStore::new(owner_id, self.source.clone()));
                    // Subscribe before loading so no change is missed.
                    let sync = spawn_sync(store.clone(), self.feed.subscribe(owner_id));
                    info!(owner = %owner_id, "Contact store created");
                    SyncedStore { store, sync }
                });
                entry.store.clone()
            }
        };

        if !store.is_loaded().await {
            store.refresh().await?;
        }
        Ok(store)
    }

    /// Merge a change into the owner's store, if one is live.
    pub async fn apply(&self, event: &ChangeEvent) {
        let store = {
            let stores = self.stores.read().await;
            stores.get(&event.owner_id).map(|entry| entry.store.clone())
        };
        if let Some(store) = store {
            store.apply(event).await;
        }
    }

    /// Drop the owner's store and stop syncing it.
    pub async fn evict(&self, owner_id: &str) -> bool {
        let removed = self.stores.write().await.remove(owner_id).is_some();
        if removed {
            info!(owner = %owner_id, "Contact store evicted");
        }
        removed
    }

    /// Evict every store whose owner fails `keep`. Returns how many went.
    pub async fn retain(&self, keep: impl Fn(&str) -> bool) -> usize {
        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|owner_id, _| {
            let kept = keep(owner_id);
            if !kept {
                info!(owner = %owner_id, "Contact store evicted");
            }
            kept
        });
        before - stores.len()
    }

    /// Number of owners with a live store.
    pub async fn len(&self) -> usize {
        self.stores.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.stores.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::{account, contact, ContactFields, Database};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_store_for_reuses_and_evicts() {
        let db = test_db().await;
        let owner = account::create_account(db.pool(), "asha@example.com", "hash")
            .await
            .unwrap();
        contact::create_contact(
            db.pool(),
            &owner.id,
            &ContactFields::new("Ravi Kumar", "9876543210"),
        )
        .await
        .unwrap();

        let feed = ChangeFeed::default();
        let registry = StoreRegistry::new(Arc::new(db), feed.clone());

        let first = registry.store_for(&owner.id).await.unwrap();
        assert!(first.is_loaded().await);
        assert_eq!(first.contacts().await.unwrap().len(), 1);

        let second = registry.store_for(&owner.id).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len().await, 1);
        assert_eq!(feed.subscriber_count(), 1);

        assert!(registry.evict(&owner.id).await);
        assert!(!registry.evict(&owner.id).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_retain_evicts_idle_owners() {
        let db = test_db().await;
        let asha = account::create_account(db.pool(), "asha@example.com", "hash")
            .await
            .unwrap();
        let ravi = account::create_account(db.pool(), "ravi@example.com", "hash")
            .await
            .unwrap();

        let feed = ChangeFeed::default();
        let registry = StoreRegistry::new(Arc::new(db), feed.clone());
        registry.store_for(&asha.id).await.unwrap();
        registry.store_for(&ravi.id).await.unwrap();
        assert_eq!(feed.subscriber_count(), 2);

        assert_eq!(registry.retain(|owner| owner == asha.id).await, 1);
        assert_eq!(registry.len().await, 1);
        assert!(!registry.evict(&ravi.id).await);
        assert!(registry.evict(&asha.id).await);

        assert_eq!(registry.retain(|_| false).await, 0);
    }
}
