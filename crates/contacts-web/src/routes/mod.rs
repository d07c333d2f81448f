//! Route handlers for the contacts API.

pub mod account;
pub mod auth;
pub mod contacts;
pub mod events;
pub mod health;
pub mod profile;
pub mod support;
pub mod transfer;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Sessions
        .route("/api/auth/sign-up", post(auth::sign_up))
        .route("/api/auth/sign-in", post(auth::sign_in))
        .route("/api/auth/sign-out", post(auth::sign_out))
        .route("/api/auth/session", get(auth::current_session))
        // Profile
        .route(
            "/api/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/api/profile/avatar", put(profile::upload_avatar))
        // Contacts
        .route(
            "/api/contacts",
            get(contacts::list_contacts).post(contacts::create_contact),
        )
        .route("/api/contacts/events", get(events::contact_events))
        .route("/api/contacts/export", get(transfer::export_contacts))
        .route("/api/contacts/import/preview", post(transfer::preview_import))
        .route("/api/contacts/import", post(transfer::import_contacts))
        .route(
            "/api/contacts/:id",
            get(contacts::get_contact)
                .put(contacts::update_contact)
                .delete(contacts::delete_contact),
        )
        // Account
        .route("/api/account", axum::routing::delete(account::delete_account))
        // Support
        .route("/api/support/bug-report", get(support::bug_report))
}
