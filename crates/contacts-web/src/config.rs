//! Server settings read from the environment (and `.env`).

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Contacts API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Where the HTTP listener binds.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Directory holding uploaded avatar images.
    pub avatar_dir: PathBuf,
    /// Public URL prefix under which avatars are served.
    pub avatar_base_url: String,
    /// How long a bearer session stays valid.
    pub session_ttl: Duration,
    /// How often expired sessions and idle contact stores are swept.
    pub session_sweep_interval: Duration,
    /// Recipient of bug reports.
    pub support_email: String,
}

impl Config {
    /// Read every setting, falling back to the defaults below.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `CONTACTS_ADDR` | Server bind address | `127.0.0.1:8787` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:contacts.db?mode=rwc` |
    /// | `AVATAR_DIR` | Avatar storage directory | `data/avatars` |
    /// | `AVATAR_BASE_URL` | Public avatar URL prefix | `http://<addr>/avatars` |
    /// | `SESSION_TTL_HOURS` | Session lifetime in hours | `720` |
    /// | `SESSION_SWEEP_MINUTES` | Expired session sweep period | `15` |
    /// | `SUPPORT_EMAIL` | Bug report recipient | `support@example.com` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr: SocketAddr = env::var("CONTACTS_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8787".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:contacts.db?mode=rwc".to_string());

        let avatar_dir = env::var("AVATAR_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/avatars"));

        let avatar_base_url = env::var("AVATAR_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}/avatars", addr));
        Url::parse(&avatar_base_url).map_err(|_| ConfigError::InvalidAvatarBaseUrl)?;

        let session_ttl_hours: u64 = match env::var("SESSION_TTL_HOURS") {
            Ok(value) => value
                .parse()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or(ConfigError::InvalidSessionTtl)?,
            Err(_) => 720,
        };

        let sweep_minutes: u64 = match env::var("SESSION_SWEEP_MINUTES") {
            Ok(value) => value
                .parse()
                .ok()
                .filter(|minutes| *minutes > 0)
                .ok_or(ConfigError::InvalidSweepInterval)?,
            Err(_) => 15,
        };

        let support_email =
            env::var("SUPPORT_EMAIL").unwrap_or_else(|_| "support@example.com".to_string());

        Ok(Self {
            addr,
            database_url,
            avatar_dir,
            avatar_base_url: avatar_base_url.trim_end_matches('/').to_string(),
            session_ttl: Duration::from_secs(session_ttl_hours * 3600),
            session_sweep_interval: Duration::from_secs(sweep_minutes * 60),
            support_email,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid CONTACTS_ADDR format")]
    InvalidAddr,

    #[error("AVATAR_BASE_URL must be an absolute URL")]
    InvalidAvatarBaseUrl,

    #[error("SESSION_TTL_HOURS must be a positive number of hours")]
    InvalidSessionTtl,

    #[error("SESSION_SWEEP_MINUTES must be a positive number of minutes")]
    InvalidSweepInterval,
}
