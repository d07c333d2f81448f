//! Periodic cleanup of expired sessions and the contact stores they kept
//! alive.

use std::time::Duration;

use database::session;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{error, info};

use crate::state::AppState;

/// What one sweep removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sweep {
    pub expired_sessions: u64,
    pub evicted_stores: usize,
}

/// Delete expired sessions, then evict the store of every owner left without
/// a live session.
pub async fn sweep_sessions(state: &AppState) -> database::Result<Sweep> {
    let expired_sessions = session::delete_expired_sessions(state.db.pool()).await?;
    let live = session::accounts_with_live_sessions(state.db.pool()).await?;
    let evicted_stores = state.stores.retain(|owner| live.contains(owner)).await;

    Ok(Sweep {
        expired_sessions,
        evicted_stores,
    })
}

/// Run [`sweep_sessions`] now and then every `period` until the task is
/// aborted. Failed sweeps are logged and retried on the next tick.
pub fn spawn_session_sweep(state: AppState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        info!(period = ?period, "Starting session sweep");

        loop {
            ticker.tick().await;

            match sweep_sessions(&state).await {
                Ok(sweep) if sweep != Sweep::default() => info!(
                    expired = sweep.expired_sessions,
                    evicted = sweep.evicted_stores,
                    "Swept sessions"
                ),
                Ok(_) => {}
                Err(e) => error!(error = %e, "Session sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::LocalAvatarStorage;
    use database::{account, Database};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn state(dir: &TempDir) -> AppState {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let avatars = Arc::new(LocalAvatarStorage::new(dir.path(), "http://localhost/avatars"));
        let config = Config {
            addr: "127.0.0.1:0".parse().unwrap(),
            database_url: "sqlite::memory:".to_string(),
            avatar_dir: dir.path().to_path_buf(),
            avatar_base_url: "http://localhost/avatars".to_string(),
            session_ttl: Duration::from_secs(3600),
            session_sweep_interval: Duration::from_millis(10),
            support_email: "support@example.com".to_string(),
        };
        AppState::new(db, avatars, config)
    }

    #[tokio::test]
    async fn test_sweep_evicts_owners_whose_sessions_expired() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir).await;
        let pool = state.db.pool();

        let active = account::create_account(pool, "asha@example.com", "hash")
            .await
            .unwrap();
        let lapsed = account::create_account(pool, "ravi@example.com", "hash")
            .await
            .unwrap();
        session::create_session(pool, &active.id, "live", Duration::from_secs(3600))
            .await
            .unwrap();
        session::create_session(pool, &lapsed.id, "stale", Duration::ZERO)
            .await
            .unwrap();

        state.stores.store_for(&active.id).await.unwrap();
        state.stores.store_for(&lapsed.id).await.unwrap();

        let sweep = sweep_sessions(&state).await.unwrap();
        assert_eq!(
            sweep,
            Sweep {
                expired_sessions: 1,
                evicted_stores: 1
            }
        );
        assert_eq!(state.stores.len().await, 1);
        assert!(state.stores.evict(&active.id).await);

        assert_eq!(sweep_sessions(&state).await.unwrap(), Sweep::default());
    }

    #[tokio::test]
    async fn test_spawned_sweep_runs_on_start() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir).await;
        let owner = account::create_account(state.db.pool(), "asha@example.com", "hash")
            .await
            .unwrap();
        state.stores.store_for(&owner.id).await.unwrap();

        let handle = spawn_session_sweep(state.clone(), state.config.session_sweep_interval);
        for _ in 0..100 {
            if state.stores.is_empty().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        handle.abort();

        assert!(state.stores.is_empty().await);
    }
}
