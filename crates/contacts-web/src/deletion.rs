//! Account deletion across avatar storage and the database.
//!
//! 1. Stage the user's avatar folder out of public view.
//! 2. Purge every relational row in one transaction. On failure the staged
//!    folder is restored and nothing is lost.
//! 3. Discard the staged folder. A failure here leaves an orphaned folder
//!    in staging and is only logged; the account is already gone.

use contact_store::{Contacts, StoreRegistry};
use database::PurgeSummary;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::storage::AvatarStorage;

pub async fn delete_account(
    account_id: &str,
    contacts: &Contacts,
    avatars: &dyn AvatarStorage,
    stores: &StoreRegistry,
) -> Result<PurgeSummary> {
    let staged = avatars.stage_folder(account_id).await?;

    let summary = match contacts.purge_owner(account_id).await {
        Ok(summary) => summary,
        Err(err) => {
            if let Some(staged) = &staged {
                if let Err(restore_err) = avatars.restore_folder(staged).await {
                    error!(
                        account = %account_id,
                        "Failed to restore avatar folder after aborted deletion: {}",
                        restore_err
                    );
                }
            }
            warn!(account = %account_id, "Account deletion aborted: {}", err);
            return Err(err.into());
        }
    };

    if let Some(staged) = &staged {
        if let Err(e) = avatars.discard_staged(staged).await {
            warn!(account = %account_id, "Failed to discard staged avatar folder: {}", e);
        }
    }

    stores.evict(account_id).await;

    info!(
        account = %account_id,
        contacts = summary.contacts,
        avatars_removed = staged.is_some(),
        "Account deleted"
    );
    Ok(summary)
}
