//! Contact state shared by the API and the command line tools.
//!
//! - [`Contacts`] performs validated mutations and publishes a
//!   [`ChangeEvent`] for each one on the [`ChangeFeed`].
//! - [`ContactStore`] caches one owner's contacts and merges those events
//!   incrementally instead of refetching.
//! - [`StoreRegistry`] holds a synced store per active owner.

mod error;
mod feed;
mod registry;
mod service;
mod store;

pub use error::{Result, StoreError};
pub use feed::{Change, ChangeEvent, ChangeFeed, Received, Subscription};
pub use registry::StoreRegistry;
pub use service::Contacts;
pub use store::{spawn_sync, ContactSource, ContactStore};
