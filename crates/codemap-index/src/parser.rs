//! Language classification and tree-sitter parsing.
//!
//! Classification is a pure function of the path suffix. Parsing wraps a
//! single tree-sitter parser that is re-targeted per language.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::SourceFile;

/// Errors that can occur while parsing.
///
/// These never reach callers of the extractor; they are logged and turned
/// into empty results.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No grammar for language: {0}")]
    UnsupportedLanguage(Language),

    #[error("Failed to parse source code")]
    ParseFailed,

    #[error("Failed to set parser language: {0}")]
    LanguageError(String),

    #[error("Failed to compile query: {0}")]
    QueryError(String),
}

/// Language tag derived from a file path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    C,
    Cpp,
    Unknown,
}

impl Language {
    /// Every language with a grammar.
    pub const SUPPORTED: [Language; 2] = [Language::C, Language::Cpp];

    /// Detect language from a file extension (without the dot).
    ///
    /// The comparison is exact: `C` and `CPP` are not recognized.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "c" | "h" => Language::C,
            "cpp" | "hpp" => Language::Cpp,
            _ => Language::Unknown,
        }
    }

    /// Detect language from a file path.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Whether this language has a grammar and extractor.
    pub fn is_known(&self) -> bool {
        !matches!(self, Language::Unknown)
    }

    /// Get the tree-sitter language, if there is one.
    pub fn tree_sitter_language(&self) -> Option<tree_sitter::Language> {
        match self {
            Language::C => Some(tree_sitter_c::LANGUAGE.into()),
            Language::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
            Language::Unknown => None,
        }
    }

    /// File extensions associated with this language.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::C => &["c", "h"],
            Language::Cpp => &["cpp", "hpp"],
            Language::Unknown => &[],
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Language::C => "C",
            Language::Cpp => "C++",
            Language::Unknown => "Unknown",
        }
    }

    /// All extensions that classify to a known language.
    pub fn supported_extensions() -> Vec<&'static str> {
        Self::SUPPORTED
            .iter()
            .flat_map(|lang| lang.extensions().iter().copied())
            .collect()
    }
}

/// Classify a path by suffix. Never fails; anything unrecognized is `Unknown`.
pub fn classify(path: &Path) -> Language {
    Language::from_path(path)
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A syntax tree paired with the bytes it was parsed from.
pub struct ParsedFile<'src> {
    /// The language the tree was parsed as.
    pub language: Language,
    /// The tree-sitter syntax tree.
    pub tree: tree_sitter::Tree,
    /// The source bytes.
    pub source: &'src [u8],
}

impl ParsedFile<'_> {
    /// Get the root node of the syntax tree.
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Get text for a node. Invalid UTF-8 is replaced, never rejected.
    pub fn node_text(&self, node: tree_sitter::Node) -> String {
        String::from_utf8_lossy(&self.source[node.byte_range()]).into_owned()
    }
}

/// Reusable tree-sitter parser for the supported languages.
pub struct Parser {
    ts_parser: tree_sitter::Parser,
    current: Option<Language>,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            ts_parser: tree_sitter::Parser::new(),
            current: None,
        }
    }

    /// Parse a source file as `language`.
    pub fn parse<'src>(
        &mut self,
        file: &'src SourceFile,
        language: Language,
    ) -> Result<ParsedFile<'src>, ParseError> {
        self.parse_bytes(file.text(), language)
    }

    /// Parse raw bytes as `language`.
    pub fn parse_bytes<'src>(
        &mut self,
        source: &'src [u8],
        language: Language,
    ) -> Result<ParsedFile<'src>, ParseError> {
        if self.current != Some(language) {
            let ts_lang = language
                .tree_sitter_language()
                .ok_or(ParseError::UnsupportedLanguage(language))?;
            self.ts_parser
                .set_language(&ts_lang)
                .map_err(|e| ParseError::LanguageError(e.to_string()))?;
            self.current = Some(language);
        }

        let tree = self
            .ts_parser
            .parse(source, None)
            .ok_or(ParseError::ParseFailed)?;

        Ok(ParsedFile {
            language,
            tree,
            source,
        })
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
