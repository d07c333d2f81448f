//! Account deletion route.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::{verify_password, AuthUser};
use crate::deletion;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// The current password, re-entered to confirm deletion.
#[derive(Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

/// Rows removed with the account.
#[derive(Serialize)]
pub struct DeleteAccountResponse {
    pub deleted_contacts: u64,
}

/// Permanently delete the account, its profile, contacts and avatar.
pub async fn delete_account(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<DeleteAccountRequest>,
) -> Result<Json<DeleteAccountResponse>> {
    if !verify_password(request.password, user.account.password_hash.clone()).await? {
        return Err(ApiError::Unauthorized("Incorrect password".to_string()));
    }

    let summary = deletion::delete_account(
        user.id(),
        &state.contacts,
        state.avatars.as_ref(),
        &state.stores,
    )
    .await?;

    Ok(Json(DeleteAccountResponse {
        deleted_contacts: summary.contacts,
    }))
}
