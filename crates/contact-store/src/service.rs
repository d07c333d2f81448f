//! Contact mutations that keep every subscriber informed.

use std::sync::Arc;

use database::validation::validate_contact;
use database::{account, contact, Contact, ContactFields, Database, PurgeSummary};
use tabular::ImportBatch;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::feed::{ChangeEvent, ChangeFeed};
use crate::registry::StoreRegistry;

/// Writes contacts to the database and publishes one change event per
/// successful mutation.
#[derive(Clone)]
pub struct Contacts {
    db: Database,
    feed: ChangeFeed,
    stores: Option<Arc<StoreRegistry>>,
}

impl Contacts {
    pub fn new(db: Database, feed: ChangeFeed) -> Self {
        Self {
            db,
            feed,
            stores: None,
        }
    }

    /// Also apply each change to the owner's cached store before
    /// broadcasting it, so the caller reads its own writes.
    pub fn with_stores(mut self, stores: Arc<StoreRegistry>) -> Self {
        self.stores = Some(stores);
        self
    }

    async fn publish(&self, event: ChangeEvent) {
        if let Some(stores) = &self.stores {
            stores.apply(&event).await;
        }
        self.feed.publish(event);
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn validate(fields: &ContactFields) -> Result<()> {
        let errors = validate_contact(fields);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Invalid(errors))
        }
    }

    /// Create a contact from a submitted form.
    pub async fn create(&self, owner_id: &str, fields: &ContactFields) -> Result<Contact> {
        Self::validate(fields)?;
        let created = contact::create_contact(self.db.pool(), owner_id, fields).await?;
        info!(owner = %owner_id, contact = %created.id, "Contact created");
        self.publish(ChangeEvent::upserted(created.clone())).await;
        Ok(created)
    }

    /// Replace every editable field of a contact.
    pub async fn update(&self, owner_id: &str, id: &str, fields: &ContactFields) -> Result<Contact> {
        Self::validate(fields)?;
        let updated = contact::update_contact(self.db.pool(), owner_id, id, fields).await?;
        info!(owner = %owner_id, contact = %id, "Contact updated");
        self.publish(ChangeEvent::upserted(updated.clone())).await;
        Ok(updated)
    }

    pub async fn delete(&self, owner_id: &str, id: &str) -> Result<()> {
        contact::delete_contact(self.db.pool(), owner_id, id).await?;
        info!(owner = %owner_id, contact = %id, "Contact deleted");
        self.publish(ChangeEvent::removed(owner_id, id)).await;
        Ok(())
    }

    /// Insert a confirmed import batch in one transaction.
    ///
    /// Rows are stored as parsed; only name and phone presence was checked
    /// at parse time. Subscribers get a single invalidation.
    pub async fn import_batch(&self, owner_id: &str, batch: &ImportBatch) -> Result<Vec<Contact>> {
        if batch.rows.is_empty() {
            return Ok(Vec::new());
        }

        let created = contact::create_contacts(self.db.pool(), owner_id, &batch.rows).await?;
        info!(
            owner = %owner_id,
            imported = created.len(),
            rejected = batch.rejected(),
            "Contacts imported"
        );
        self.publish(ChangeEvent::invalidated(owner_id)).await;
        Ok(created)
    }

    /// The owner's contacts straight from the database, ordered by name.
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Contact>> {
        Ok(contact::list_contacts(self.db.pool(), owner_id).await?)
    }

    pub async fn get(&self, owner_id: &str, id: &str) -> Result<Contact> {
        Ok(contact::get_contact(self.db.pool(), owner_id, id).await?)
    }

    /// Delete the owner's account with all contacts, profile and sessions.
    pub async fn purge_owner(&self, owner_id: &str) -> Result<PurgeSummary> {
        let summary = account::purge_account(self.db.pool(), owner_id).await?;
        self.publish(ChangeEvent::invalidated(owner_id)).await;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Change, Received};
    use std::time::Duration;
    use tabular::{parse_import, ImportOutcome};

    async fn setup() -> (Contacts, String) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let owner = account::create_account(db.pool(), "asha@example.com", "hash")
            .await
            .unwrap();
        (Contacts::new(db, ChangeFeed::default()), owner.id)
    }

    fn ravi() -> ContactFields {
        ContactFields {
            expected_wage: "650.50".to_string(),
            ..ContactFields::new("Ravi Kumar", "9876543210")
        }
    }

    #[tokio::test]
    async fn test_create_publishes_upsert() {
        let (contacts, owner) = setup().await;
        let mut sub = contacts.feed().subscribe(&owner);

        let created = contacts.create(&owner, &ravi()).await.unwrap();

        match sub.recv().await {
            Some(Received::Event(event)) => {
                assert_eq!(event.change, Change::Upserted(created));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_fields() {
        let (contacts, owner) = setup().await;
        let mut fields = ContactFields::new("Ra", "1234567890");
        fields.daily_wage = "-5".to_string();

        match contacts.create(&owner, &fields).await {
            Err(StoreError::Invalid(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["full_name", "phone_number", "daily_wage"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(contacts.list(&owner).await.unwrap().is_empty());
        assert_eq!(contacts.feed().subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_update_and_missing_contact() {
        let (contacts, owner) = setup().await;
        let created = contacts.create(&owner, &ravi()).await.unwrap();

        let mut fields = ravi();
        fields.address = "Guntur".to_string();
        let updated = contacts.update(&owner, &created.id, &fields).await.unwrap();
        assert_eq!(updated.fields.address, "Guntur");

        let err = contacts.update(&owner, "missing", &fields).await.unwrap_err();
        assert!(err.is_not_found());
        let err = contacts.delete(&owner, "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_import_batch_emits_one_invalidation() {
        let (contacts, owner) = setup().await;
        let mut sub = contacts.feed().subscribe(&owner);

        let batch = match parse_import("Phone\tName\n9876543210\tRavi\n\t\n8123456789\tSita\n") {
            ImportOutcome::Ready(batch) => batch,
            other => panic!("expected rows, got {other:?}"),
        };
        // The tab-only line is blank, not a rejected row.
        assert_eq!(batch.rows_read, 2);
        assert_eq!(batch.rejected(), 0);
        let created = contacts.import_batch(&owner, &batch).await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(contacts.list(&owner).await.unwrap().len(), 2);

        assert_eq!(
            sub.recv().await,
            Some(Received::Event(ChangeEvent::invalidated(&owner)))
        );
    }

    #[tokio::test]
    async fn test_delete_removes_from_store_and_fetch() {
        let (contacts, owner) = setup().await;
        let keep = contacts
            .create(&owner, &ContactFields::new("Sita Devi", "8123456789"))
            .await
            .unwrap();
        let gone = contacts.create(&owner, &ravi()).await.unwrap();

        let registry = StoreRegistry::new(
            Arc::new(contacts.database().clone()),
            contacts.feed().clone(),
        );
        let store = registry.store_for(&owner).await.unwrap();
        assert_eq!(store.contacts().await.unwrap().len(), 2);

        contacts.delete(&owner, &gone.id).await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), async {
            while store.get(&gone.id).await.unwrap().is_some() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(store.contacts().await.unwrap(), vec![keep.clone()]);
        assert_eq!(contacts.list(&owner).await.unwrap(), vec![keep]);
    }

    #[tokio::test]
    async fn test_purge_owner() {
        let (contacts, owner) = setup().await;
        contacts.create(&owner, &ravi()).await.unwrap();

        let summary = contacts.purge_owner(&owner).await.unwrap();
        assert_eq!(summary.contacts, 1);
        assert!(contacts.list(&owner).await.unwrap().is_empty());
        assert!(contacts.purge_owner(&owner).await.unwrap_err().is_not_found());
    }
}
