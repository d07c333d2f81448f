//! Per-owner in-memory contact cache.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use database::{contact, Contact, Database};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::feed::{Change, ChangeEvent, Received, Subscription};

/// Where a store loads its contacts from.
#[async_trait]
pub trait ContactSource: Send + Sync {
    /// All contacts owned by `owner_id`, ordered by name.
    async fn fetch_contacts(&self, owner_id: &str) -> database::Result<Vec<Contact>>;
}

#[async_trait]
impl ContactSource for Database {
    async fn fetch_contacts(&self, owner_id: &str) -> database::Result<Vec<Contact>> {
        contact::list_contacts(self.pool(), owner_id).await
    }
}

/// Same ordering as `list_contacts`: ASCII-lowercased name, then id.
fn name_order(a: &Contact, b: &Contact) -> Ordering {
    a.fields
        .full_name
        .to_ascii_lowercase()
        .cmp(&b.fields.full_name.to_ascii_lowercase())
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Debug, Default)]
struct StoreState {
    contacts: Vec<Contact>,
    loaded: bool,
    stale: bool,
    /// Bumped on every applied change.
    epoch: u64,
    /// Tickets handed out to refreshes.
    issued: u64,
    /// Ticket of the refresh whose result is held.
    landed: u64,
}

/// Cached contacts of a single owner.
///
/// The cache is filled with [`refresh`](Self::refresh) and kept current by
/// [`apply`](Self::apply)ing change events, so a single mutation never
/// costs a full refetch.
pub struct ContactStore {
    owner_id: String,
    source: Arc<dyn ContactSource>,
    state: RwLock<StoreState>,
}

impl std::fmt::Debug for ContactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactStore")
            .field("owner_id", &self.owner_id)
            .finish_non_exhaustive()
    }
}

impl ContactStore {
    pub fn new(owner_id: impl Into<String>, source: Arc<dyn ContactSource>) -> Self {
        Self {
            owner_id: owner_id.into(),
            source,
            state: RwLock::new(StoreState::default()),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Whether a fetch has completed at least once.
    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.loaded
    }

    /// Replace the cache with a fresh fetch.
    ///
    /// Safe to call repeatedly or concurrently. A fetch that finishes after
    /// a newer one is discarded, and a fetch that overlapped an applied
    /// change leaves the cache marked stale.
    pub async fn refresh(&self) -> Result<()> {
        let (ticket, epoch) = {
            let mut state = self.state.write().await;
            state.issued += 1;
            (state.issued, state.epoch)
        };

        let contacts = self.source.fetch_contacts(&self.owner_id).await?;

        let mut state = self.state.write().await;
        if ticket < state.landed {
            debug!(owner = %self.owner_id, ticket, "Discarding superseded fetch");
            return Ok(());
        }
        debug!(owner = %self.owner_id, count = contacts.len(), "Contacts refreshed");
        state.landed = ticket;
        state.contacts = contacts;
        state.loaded = true;
        state.stale = state.epoch != epoch;
        Ok(())
    }

    /// Merge a change into the cache. Events for other owners are ignored.
    pub async fn apply(&self, event: &ChangeEvent) {
        if event.owner_id != self.owner_id {
            return;
        }

        let mut state = self.state.write().await;
        state.epoch += 1;

        match &event.change {
            Change::Upserted(contact) => {
                state.contacts.retain(|c| c.id != contact.id);
                let at = state
                    .contacts
                    .partition_point(|c| name_order(c, contact) == Ordering::Less);
                state.contacts.insert(at, contact.clone());
            }
            Change::Removed { id } => state.contacts.retain(|c| &c.id != id),
            Change::Invalidated => state.stale = true,
        }
    }

    /// Mark the cache for refetch on next read.
    pub async fn invalidate(&self) {
        self.state.write().await.stale = true;
    }

    async fn ensure_fresh(&self) -> Result<()> {
        let needs_fetch = {
            let state = self.state.read().await;
            !state.loaded || state.stale
        };
        if needs_fetch {
            self.refresh().await?;
        }
        Ok(())
    }

    /// All cached contacts in name order, fetching first if needed.
    pub async fn contacts(&self) -> Result<Vec<Contact>> {
        self.ensure_fresh().await?;
        Ok(self.state.read().await.contacts.clone())
    }

    /// A single cached contact.
    pub async fn get(&self, id: &str) -> Result<Option<Contact>> {
        self.ensure_fresh().await?;
        let state = self.state.read().await;
        Ok(state.contacts.iter().find(|c| c.id == id).cloned())
    }

    /// Contacts whose name contains `query` (case-insensitive) or whose
    /// phone number contains it. A blank query returns everything.
    pub async fn search(&self, query: &str) -> Result<Vec<Contact>> {
        let query = query.trim();
        if query.is_empty() {
            return self.contacts().await;
        }

        self.ensure_fresh().await?;
        let needle = query.to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .contacts
            .iter()
            .filter(|c| {
                c.fields.full_name.to_lowercase().contains(&needle)
                    || c.fields.phone_number.contains(query)
            })
            .cloned()
            .collect())
    }
}

/// Keep `store` in sync with its owner's feed subscription.
///
/// When the subscription lags behind the feed, the missed events are
/// unknown, so the store refetches instead of merging.
pub fn spawn_sync(store: Arc<ContactStore>, mut subscription: Subscription) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(received) = subscription.recv().await {
            match received {
                Received::Event(event) => store.apply(&event).await,
                Received::Lagged(skipped) => {
                    warn!(owner = %store.owner_id(), skipped, "Change feed lagged, refetching");
                    store.invalidate().await;
                    if let Err(e) = store.refresh().await {
                        warn!(owner = %store.owner_id(), "Refetch after lag failed: {}", e);
                    }
                }
            }
        }
        info!(owner = %store.owner_id(), "Change feed closed, sync stopped");
    })
}
