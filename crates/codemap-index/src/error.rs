//! Error types for indexing operations.
//!
//! Reading a file is the only operation that fails outward. Everything past
//! the read (classification, parsing, extraction) degrades to empty results.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for indexing operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors surfaced to callers of the indexer.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A source file could not be read from disk.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed (unreadable directory, bad ignore file).
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),
}

impl IndexError {
    /// Build a read error for `path`.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IndexError::Read {
            path: path.into(),
            source,
        }
    }

    /// The path that failed, if the error is tied to one file.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            IndexError::Read { path, .. } => Some(path),
            IndexError::Walk(_) => None,
        }
    }
}
