//! JSON API for the worker contact manager.
//!
//! Bearer-token sessions, profile and avatar management, contact CRUD with
//! live change events, CSV/TSV export and import, and account deletion.

mod auth;
mod config;
mod deletion;
mod error;
mod routes;
mod state;
mod storage;
mod sweep;

use std::sync::Arc;

use database::Database;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::storage::LocalAvatarStorage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting contacts server");

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Avatar storage, served from disk
    let avatars = Arc::new(LocalAvatarStorage::new(
        &config.avatar_dir,
        &config.avatar_base_url,
    ));
    let avatar_files = ServeDir::new(avatars.objects_dir());

    let addr = config.addr;
    let sweep_every = config.session_sweep_interval;
    let state = AppState::new(db, avatars, config);
    let _sweeper = sweep::spawn_session_sweep(state.clone(), sweep_every);

    let app = routes::router()
        .nest_service("/avatars", avatar_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!(addr = %addr, "Contacts server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests;
