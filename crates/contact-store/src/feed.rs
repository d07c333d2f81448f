//! Change notifications for contact rows.

use database::Contact;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};

/// What happened to an owner's contacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    /// A contact was created or replaced.
    Upserted(Contact),
    /// A contact was deleted.
    Removed { id: String },
    /// Many rows changed at once; cached copies must be refetched.
    Invalidated,
}

/// A change scoped to one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub owner_id: String,
    pub change: Change,
}

impl ChangeEvent {
    pub fn upserted(contact: Contact) -> Self {
        Self {
            owner_id: contact.user_id.clone(),
            change: Change::Upserted(contact),
        }
    }

    pub fn removed(owner_id: &str, id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            change: Change::Removed { id: id.to_string() },
        }
    }

    pub fn invalidated(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            change: Change::Invalidated,
        }
    }
}

/// Item delivered to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Event(ChangeEvent),
    /// The subscriber fell behind and this many events were dropped.
    Lagged(u64),
}

/// Multi-subscriber broadcast of contact changes.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    /// Default number of buffered events per subscriber.
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event, returning how many subscribers were reached.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        tracing::debug!(owner = %event.owner_id, change = ?event.change, "Publishing contact change");
        // No subscribers is not an error.
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to one owner's changes.
    pub fn subscribe(&self, owner_id: &str) -> Subscription {
        Subscription {
            owner_id: owner_id.to_string(),
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions across all owners.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// A feed subscription filtered to a single owner.
#[derive(Debug)]
pub struct Subscription {
    owner_id: String,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Wait for the next event for this owner.
    ///
    /// Returns `None` once the feed is dropped.
    pub async fn recv(&mut self) -> Option<Received> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.owner_id == self.owner_id => return Some(Received::Event(event)),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => return Some(Received::Lagged(skipped)),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Turn the subscription into a stream, e.g. for server-sent events.
    pub fn into_stream(self) -> impl Stream<Item = Received> + Send + 'static {
        let owner_id = self.owner_id;
        BroadcastStream::new(self.receiver).filter_map(move |item| match item {
            Ok(event) if event.owner_id == owner_id => Some(Received::Event(event)),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => Some(Received::Lagged(skipped)),
        })
    }
}
