//! Indexing of files and directory trees.
//!
//! The indexer drives classification and extraction and keeps every scan
//! in a [`SymbolCache`] it owns, so unchanged files are not parsed twice.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ignore::WalkBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::SymbolCache;
use crate::error::Result;
use crate::extractor::{FileScan, SymbolExtractor};
use crate::filter::{IGNORE_FILE, PathFilter};
use crate::parser::Language;
use crate::source::SourceFile;

/// Statistics from an indexing operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Number of source files scanned or served from cache.
    pub files_processed: usize,
    /// Number of files skipped because their language is unknown.
    pub files_skipped: usize,
    /// Number of symbols in the processed files.
    pub symbols_found: usize,
    /// Number of call sites in the processed files.
    pub calls_found: usize,
    /// Number of files served from cache.
    pub cache_hits: usize,
    /// Time spent parsing in milliseconds.
    pub parse_time_ms: u64,
}

impl IndexStats {
    /// Merge another IndexStats into this one.
    pub fn merge(&mut self, other: &IndexStats) {
        self.files_processed += other.files_processed;
        self.files_skipped += other.files_skipped;
        self.symbols_found += other.symbols_found;
        self.calls_found += other.calls_found;
        self.cache_hits += other.cache_hits;
        self.parse_time_ms += other.parse_time_ms;
    }
}

/// Directory walking options.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Whether to respect `.gitignore` and `.codemapignore` files.
    pub use_gitignore: bool,
    /// Additional gitignore-style patterns to skip.
    pub ignore_patterns: Vec<String>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            use_gitignore: true,
            ignore_patterns: vec!["build".to_string(), "node_modules".to_string()],
        }
    }
}

/// Coordinates reading, extraction and caching.
pub struct Indexer {
    extractor: SymbolExtractor,
    cache: SymbolCache,
    config: IndexerConfig,
}

impl Indexer {
    /// Create an indexer that fills the given cache.
    pub fn new(cache: SymbolCache) -> Self {
        Self::with_config(cache, IndexerConfig::default())
    }

    pub fn with_config(cache: SymbolCache, config: IndexerConfig) -> Self {
        Self {
            extractor: SymbolExtractor::new(),
            cache,
            config,
        }
    }

    /// Scan a single file, using the cache when its contents are unchanged.
    ///
    /// Fails only if the file cannot be read.
    pub fn scan_file(&mut self, path: &Path) -> Result<FileScan> {
        let file = SourceFile::read(path)?;
        let (scan, _) = self.scan_source(&file);
        Ok(scan)
    }

    /// Index a single file.
    ///
    /// Unknown-language files are counted as skipped and are not read.
    pub fn index_file(&mut self, path: &Path) -> Result<IndexStats> {
        let mut stats = IndexStats::default();

        if !Language::from_path(path).is_known() {
            debug!(path = %path.display(), "Skipping file with unknown language");
            stats.files_skipped = 1;
            return Ok(stats);
        }

        let file = SourceFile::read(path)?;
        let (scan, parse_time) = self.scan_source(&file);

        stats.files_processed = 1;
        stats.symbols_found = scan.symbols.len();
        stats.calls_found = scan.calls.len();
        match parse_time {
            Some(elapsed) => stats.parse_time_ms = elapsed.as_millis() as u64,
            None => stats.cache_hits = 1,
        }

        Ok(stats)
    }

    /// Drop the cached scan for a file and index it again.
    pub fn rebuild_file(&mut self, path: &Path) -> Result<IndexStats> {
        self.cache.invalidate(path);
        self.index_file(path)
    }

    /// Forget a file. Returns whether it had been indexed.
    pub fn remove_file(&mut self, path: &Path) -> bool {
        let removed = self.cache.invalidate(path);
        if removed {
            debug!(path = %path.display(), "Removed file from index");
        }
        removed
    }

    /// Index every file under `root`, honoring ignore files and patterns.
    ///
    /// Hidden files and directories are skipped. Files are visited in
    /// sorted order.
    pub fn index_directory(&mut self, root: &Path) -> Result<IndexStats> {
        let start = Instant::now();
        let mut stats = IndexStats::default();

        for path in self.walk(root)? {
            let file_stats = self.index_file(&path)?;
            stats.merge(&file_stats);
        }

        info!(
            root = %root.display(),
            files = stats.files_processed,
            skipped = stats.files_skipped,
            symbols = stats.symbols_found,
            cache_hits = stats.cache_hits,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Indexed directory"
        );

        Ok(stats)
    }

    /// Collect the files under `root` that survive the ignore rules.
    fn walk(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let filter = PathFilter::new(root, false, &self.config.ignore_patterns)?;
        let use_gitignore = self.config.use_gitignore;

        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(true)
            .git_ignore(use_gitignore)
            .git_exclude(use_gitignore)
            .git_global(false)
            .require_git(false)
            .parents(false)
            .sort_by_file_name(|a, b| a.cmp(b));
        if use_gitignore {
            builder.add_custom_ignore_filename(IGNORE_FILE);
        }
        builder.filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !filter.is_ignored(entry.path(), is_dir)
        });

        let mut paths = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            if entry.file_type().is_some_and(|t| t.is_file()) {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }

    /// Look `file` up in the cache, extracting and inserting on a miss.
    ///
    /// Returns the parse time on a miss and `None` on a hit.
    fn scan_source(&mut self, file: &SourceFile) -> (FileScan, Option<Duration>) {
        if let Some(scan) = self.cache.lookup(file.path(), file.text()) {
            return (scan.clone(), None);
        }

        let start = Instant::now();
        let scan = self.extractor.scan(file);
        let elapsed = start.elapsed();

        if scan.language.is_known() {
            self.cache.insert(file.path(), scan.clone());
        }
        (scan, Some(elapsed))
    }

    /// Get a reference to the underlying cache.
    pub fn cache(&self) -> &SymbolCache {
        &self.cache
    }

    /// Get a mutable reference to the underlying cache.
    pub fn cache_mut(&mut self) -> &mut SymbolCache {
        &mut self.cache
    }

    /// Consume the indexer and return the cache.
    pub fn into_cache(self) -> SymbolCache {
        self.cache
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }
}
