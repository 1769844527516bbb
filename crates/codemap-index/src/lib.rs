//! codemap-index: Code map infrastructure for C and C++
//!
//! This crate provides the core indexing functionality for codemap:
//! - Language classification from file paths
//! - Symbol and call-site extraction via tree-sitter
//! - A per-file scan cache validated by content hash
//! - Directory indexing that honors ignore files
//! - Token scoring across a project
//! - File watching for incremental updates

pub mod cache;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod indexer;
pub mod lang;
pub mod parser;
pub mod scoring;
pub mod source;
pub mod symbols;
pub mod watcher;

pub use cache::{CacheStats, SymbolCache};
pub use error::{IndexError, Result};
pub use extractor::{FileScan, SymbolExtractor};
pub use filter::{IGNORE_FILE, PathFilter};
pub use indexer::{IndexStats, Indexer, IndexerConfig};
pub use lang::{CExtractor, CppExtractor, LanguageExtractor, extractor_for};
pub use parser::{Language, ParseError, ParsedFile, Parser, classify};
pub use scoring::{RankedToken, ScoreConfig, TokenScorer, TokenScores, top_tokens};
pub use source::{SourceFile, content_hash};
pub use symbols::{Call, Symbol, SymbolKind};
pub use watcher::{FileEvent, FileWatcher, WatchError, WatcherConfig, watch_and_rebuild};
