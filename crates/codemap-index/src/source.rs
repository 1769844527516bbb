//! Source files as read from disk.

use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};
use crate::parser::Language;

/// A file path and its raw bytes. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
    text: Vec<u8>,
}

impl SourceFile {
    /// Wrap bytes that are already in memory.
    pub fn new(path: impl Into<PathBuf>, text: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Read a file from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read(path).map_err(|e| IndexError::read(path, e))?;
        Ok(Self::new(path, text))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Language tag derived from the path.
    pub fn language(&self) -> Language {
        Language::from_path(&self.path)
    }

    /// xxh3 hash of the contents, used to validate cached scans.
    pub fn content_hash(&self) -> u64 {
        content_hash(&self.text)
    }

    /// Number of lines; a trailing newline does not start a new line.
    pub fn line_count(&self) -> usize {
        if self.text.is_empty() {
            return 0;
        }
        let newlines = self.text.iter().filter(|&&b| b == b'\n').count();
        if self.text.ends_with(b"\n") {
            newlines
        } else {
            newlines + 1
        }
    }
}

/// Hash raw file contents.
pub fn content_hash(bytes: &[u8]) -> u64 {
    xxhash_rust::xxh3::xxh3_64(bytes)
}
