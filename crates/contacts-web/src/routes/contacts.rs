//! Contact CRUD and search routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::{Contact, ContactFields};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::Result;
use crate::state::AppState;

/// Optional search filter.
#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// List the user's contacts in name order, optionally filtered.
pub async fn list_contacts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Contact>>> {
    let store = state.stores.store_for(user.id()).await?;
    let contacts = store.search(query.q.as_deref().unwrap_or_default()).await?;
    Ok(Json(contacts))
}

pub async fn create_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Json(fields): Json<ContactFields>,
) -> Result<(StatusCode, Json<Contact>)> {
    let created = state.contacts.create(user.id(), &fields).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Contact>> {
    Ok(Json(state.contacts.get(user.id(), &id).await?))
}

/// Replace every editable field.
pub async fn update_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(fields): Json<ContactFields>,
) -> Result<Json<Contact>> {
    Ok(Json(state.contacts.update(user.id(), &id, &fields).await?))
}

pub async fn delete_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.contacts.delete(user.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
