//! Per-file cache of scan results.
//!
//! Entries are keyed by path and validated against the xxh3 hash of the
//! file's current bytes, so a stale entry is never returned even if the
//! caller forgets to invalidate it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::trace;

use crate::extractor::FileScan;
use crate::source::content_hash;

/// Hit/miss counters for a [`SymbolCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

/// Cache of [`FileScan`]s owned by whoever drives indexing.
#[derive(Debug, Default)]
pub struct SymbolCache {
    entries: HashMap<PathBuf, FileScan>,
    hits: usize,
    misses: usize,
}

impl SymbolCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached scan for `path` if it was taken from exactly `text`.
    pub fn lookup(&mut self, path: &Path, text: &[u8]) -> Option<&FileScan> {
        let hash = content_hash(text);
        match self.entries.get(path) {
            Some(scan) if scan.content_hash == hash => {
                self.hits += 1;
                trace!(path = %path.display(), "Cache hit");
                Some(scan)
            }
            _ => {
                self.misses += 1;
                trace!(path = %path.display(), "Cache miss");
                None
            }
        }
    }

    /// Store a scan, replacing any earlier scan of the same path.
    pub fn insert(&mut self, path: impl Into<PathBuf>, scan: FileScan) -> Option<FileScan> {
        self.entries.insert(path.into(), scan)
    }

    /// Drop the entry for `path`. Returns whether one existed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The cached scan for `path`, without validating it.
    pub fn get(&self, path: &Path) -> Option<&FileScan> {
        self.entries.get(path)
    }

    /// Iterate over cached scans in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &FileScan)> {
        self.entries.iter().map(|(path, scan)| (path.as_path(), scan))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::SymbolExtractor;
    use crate::source::SourceFile;

    fn scan(path: &str, text: &str) -> FileScan {
        SymbolExtractor::new().scan(&SourceFile::new(path, text))
    }

    #[test]
    fn test_hit_for_unchanged_content() {
        let mut cache = SymbolCache::new();
        let text = "int main(void) { return 0; }\n";
        cache.insert("main.c", scan("main.c", text));

        let hit = cache.lookup(Path::new("main.c"), text.as_bytes());
        assert_eq!(hit.map(|s| s.symbols.len()), Some(1));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 0,
                entries: 1
            }
        );
    }

    #[test]
    fn test_miss_after_modification() {
        let mut cache = SymbolCache::new();
        cache.insert("main.c", scan("main.c", "int main(void) { return 0; }\n"));

        let changed = b"int main(void) { return 1; }\n";
        assert!(cache.lookup(Path::new("main.c"), changed).is_none());
        assert_eq!(cache.stats().misses, 1);
        // Stale entry stays until replaced or invalidated
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_miss_for_unknown_path() {
        let mut cache = SymbolCache::new();
        assert!(cache.lookup(Path::new("absent.c"), b"").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_insert_replaces() {
        let mut cache = SymbolCache::new();
        cache.insert("a.c", scan("a.c", "void f(void) {}\n"));
        let previous = cache.insert("a.c", scan("a.c", "void f(void) {}\nvoid g(void) {}\n"));

        assert_eq!(previous.map(|s| s.symbols.len()), Some(1));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(Path::new("a.c")).map(|s| s.symbols.len()), Some(2));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let mut cache = SymbolCache::new();
        let text = "void f(void) {}\n";
        cache.insert("a.c", scan("a.c", text));
        cache.insert("b.c", scan("b.c", text));

        assert!(cache.invalidate(Path::new("a.c")));
        assert!(!cache.invalidate(Path::new("a.c")));
        assert!(cache.lookup(Path::new("a.c"), text.as_bytes()).is_none());
        assert!(cache.lookup(Path::new("b.c"), text.as_bytes()).is_some());

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 1);
    }
}
