//! Symbol extraction dispatched on the language tag.
//!
//! The extractor never fails: unknown languages, parser failures and query
//! errors all produce empty sequences (the latter two are logged).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::lang::{LanguageExtractor, extractor_for};
use crate::parser::{Language, ParseError, ParsedFile, Parser};
use crate::source::SourceFile;
use crate::symbols::{Call, Symbol};

/// Everything extracted from one file in a single pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileScan {
    /// Language the file was classified as.
    pub language: Language,
    /// Definitions in source order.
    pub symbols: Vec<Symbol>,
    /// Call sites in source order.
    pub calls: Vec<Call>,
    /// Number of lines in the file.
    pub line_count: usize,
    /// Hash of the bytes the scan was taken from.
    pub content_hash: u64,
}

impl FileScan {
    /// An empty scan, used for unknown languages.
    pub fn empty(file: &SourceFile, language: Language) -> Self {
        Self {
            language,
            symbols: Vec::new(),
            calls: Vec::new(),
            line_count: file.line_count(),
            content_hash: file.content_hash(),
        }
    }

    /// Whether `name` is defined by a symbol in this scan.
    pub fn defines(&self, name: &str) -> bool {
        self.symbols.iter().any(|s| s.name == name)
    }
}

/// Extracts symbols and calls from source files.
///
/// Owns a tree-sitter parser, so one extractor should not be shared across
/// threads; create one per worker instead.
pub struct SymbolExtractor {
    parser: Parser,
}

impl SymbolExtractor {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Extract definitions from `file` as `language`, in source order.
    pub fn extract(&mut self, file: &SourceFile, language: Language) -> Vec<Symbol> {
        self.with_parsed(file, language, |extractor, parsed| {
            extractor.extract_symbols(parsed)
        })
    }

    /// Extract call sites from `file` as `language`, in source order.
    pub fn extract_calls(&mut self, file: &SourceFile, language: Language) -> Vec<Call> {
        self.with_parsed(file, language, |extractor, parsed| {
            extractor.extract_calls(parsed)
        })
    }

    /// Classify `file` by path and extract symbols and calls with one parse.
    pub fn scan(&mut self, file: &SourceFile) -> FileScan {
        let language = file.language();
        let mut scan = FileScan::empty(file, language);

        let Some(extractor) = extractor_for(language) else {
            return scan;
        };

        let parsed = match self.parser.parse(file, language) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(path = %file.path().display(), error = %e, "Failed to parse file");
                return scan;
            }
        };

        scan.symbols = degrade(file, extractor.extract_symbols(&parsed));
        scan.calls = degrade(file, extractor.extract_calls(&parsed));

        debug!(
            path = %file.path().display(),
            language = %language,
            symbols = scan.symbols.len(),
            calls = scan.calls.len(),
            "Scanned file"
        );
        scan
    }

    fn with_parsed<T>(
        &mut self,
        file: &SourceFile,
        language: Language,
        run: impl FnOnce(&dyn LanguageExtractor, &ParsedFile) -> Result<Vec<T>, ParseError>,
    ) -> Vec<T> {
        let Some(extractor) = extractor_for(language) else {
            return Vec::new();
        };

        match self.parser.parse(file, language) {
            Ok(parsed) => degrade(file, run(extractor, &parsed)),
            Err(e) => {
                warn!(path = %file.path().display(), error = %e, "Failed to parse file");
                Vec::new()
            }
        }
    }
}

impl Default for SymbolExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn degrade<T>(file: &SourceFile, result: Result<Vec<T>, ParseError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(path = %file.path().display(), error = %e, "Extraction failed");
        Vec::new()
    })
}
