//! Error types for import/export.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the import/export engine.
///
/// A file without any acceptable row is not an error; see
/// [`ImportOutcome::NoValidRows`](crate::ImportOutcome::NoValidRows).
#[derive(Debug, Error)]
pub enum TabularError {
    /// The import file could not be read (missing, unreadable, not UTF-8).
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Export format name not recognised.
    #[error("unknown export format: {0}")]
    UnknownFormat(String),
}

/// Result type for import/export operations.
pub type Result<T> = std::result::Result<T, TabularError>;
