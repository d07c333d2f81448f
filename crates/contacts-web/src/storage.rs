//! Avatar object storage.
//!
//! Objects live under per-user folders (`<user-id>/<file>`). The local
//! implementation keeps them on disk below `<root>/objects`, which is what
//! the server exposes at the public avatar URL.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::RngCore;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from avatar storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// A folder moved aside by [`AvatarStorage::stage_folder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFolder {
    pub folder: String,
    token: String,
}

/// Object storage scoped to per-user folders.
#[async_trait]
pub trait AvatarStorage: Send + Sync {
    /// Keys of every object in `folder`. A missing folder is empty.
    async fn list(&self, folder: &str) -> Result<Vec<String>>;

    /// Remove objects; keys that do not exist are skipped.
    async fn remove(&self, keys: &[String]) -> Result<()>;

    /// Store `bytes` under `key`, replacing any existing object.
    async fn upload(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Public URL of an object.
    fn public_url(&self, key: &str) -> String;

    /// Move a whole folder out of public view so it can be restored or
    /// discarded later. `None` when the folder does not exist.
    async fn stage_folder(&self, folder: &str) -> Result<Option<StagedFolder>>;

    /// Put a staged folder back where it was.
    async fn restore_folder(&self, staged: &StagedFolder) -> Result<()>;

    /// Permanently delete a staged folder.
    async fn discard_staged(&self, staged: &StagedFolder) -> Result<()>;
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Reject keys that could escape the storage root.
fn check_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.contains('\\')
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Filesystem-backed avatar storage.
#[derive(Debug, Clone)]
pub struct LocalAvatarStorage {
    objects: PathBuf,
    staging: PathBuf,
    base_url: String,
}

impl LocalAvatarStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            objects: root.join("objects"),
            staging: root.join("staging"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Directory served publicly.
    pub fn objects_dir(&self) -> &Path {
        &self.objects
    }

    fn staged_path(&self, staged: &StagedFolder) -> PathBuf {
        self.staging
            .join(format!("{}.{}", staged.folder, staged.token))
    }
}

#[async_trait]
impl AvatarStorage for LocalAvatarStorage {
    async fn list(&self, folder: &str) -> Result<Vec<String>> {
        check_key(folder)?;
        let dir = self.objects.join(folder);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir)(e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error(&dir))? {
            if let Some(name) = entry.file_name().to_str() {
                keys.push(format!("{}/{}", folder, name));
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn remove(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            check_key(key)?;
            let path = self.objects.join(key);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(key = %key, "Removed avatar object"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(&path)(e)),
            }
        }
        Ok(())
    }

    async fn upload(&self, key: &str, bytes: &[u8]) -> Result<()> {
        check_key(key)?;
        let path = self.objects.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io_error(parent))?;
        }
        tokio::fs::write(&path, bytes).await.map_err(io_error(&path))?;
        info!(key = %key, size = bytes.len(), "Stored avatar object");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    async fn stage_folder(&self, folder: &str) -> Result<Option<StagedFolder>> {
        check_key(folder)?;
        let source = self.objects.join(folder);
        if !tokio::fs::try_exists(&source)
            .await
            .map_err(io_error(&source))?
        {
            return Ok(None);
        }

        let mut token = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut token);
        let staged = StagedFolder {
            folder: folder.to_string(),
            token: hex::encode(token),
        };

        tokio::fs::create_dir_all(&self.staging)
            .await
            .map_err(io_error(&self.staging))?;
        let target = self.staged_path(&staged);
        tokio::fs::rename(&source, &target)
            .await
            .map_err(io_error(&source))?;

        debug!(folder = %folder, "Staged avatar folder");
        Ok(Some(staged))
    }

    async fn restore_folder(&self, staged: &StagedFolder) -> Result<()> {
        let target = self.objects.join(&staged.folder);
        tokio::fs::create_dir_all(&self.objects)
            .await
            .map_err(io_error(&self.objects))?;
        tokio::fs::rename(self.staged_path(staged), &target)
            .await
            .map_err(io_error(&target))?;
        info!(folder = %staged.folder, "Restored avatar folder");
        Ok(())
    }

    async fn discard_staged(&self, staged: &StagedFolder) -> Result<()> {
        let path = self.staged_path(staged);
        tokio::fs::remove_dir_all(&path)
            .await
            .map_err(io_error(&path))?;
        debug!(folder = %staged.folder, "Discarded staged avatar folder");
        Ok(())
    }
}
