//! C++ symbol extraction.
//!
//! Extends the C patterns with classes, `using` aliases and `new`
//! expressions. Members of classes and namespaces carry their scope, and
//! out-of-line definitions (`Foo::bar`) are split into scope and name.

use std::sync::OnceLock;

use super::{LanguageExtractor, LanguageQueries, collect_calls, collect_symbols};
use crate::parser::{Language, ParseError, ParsedFile};
use crate::symbols::{Call, Symbol};

/// Tree-sitter query for C++ definitions.
const SYMBOLS_QUERY: &str = r#"
; Functions and member functions
(function_definition) @function

; Classes
(class_specifier
  name: (_)
  body: (field_declaration_list)) @type

; Structs
(struct_specifier
  name: (_)
  body: (field_declaration_list)) @type

; Unions
(union_specifier
  name: (_)
  body: (field_declaration_list)) @type

; Enums (plain and scoped)
(enum_specifier
  name: (_)
  body: (enumerator_list)) @type

; using Name = ...;
(alias_declaration
  name: (type_identifier)) @type

; Typedefs
(type_definition) @typedef
"#;

/// Tree-sitter query for C++ call sites.
const CALLS_QUERY: &str = r#"
(call_expression
  function: (_) @callee) @call

(new_expression
  type: (_) @constructed) @new
"#;

static CPP_QUERIES: OnceLock<Result<LanguageQueries, String>> = OnceLock::new();

fn get_queries() -> Result<&'static LanguageQueries, ParseError> {
    CPP_QUERIES
        .get_or_init(|| {
            let language = tree_sitter_cpp::LANGUAGE.into();
            LanguageQueries::new(&language, SYMBOLS_QUERY, CALLS_QUERY)
        })
        .as_ref()
        .map_err(|e| ParseError::QueryError(e.clone()))
}

/// C++ symbol extractor.
pub struct CppExtractor;

impl LanguageExtractor for CppExtractor {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn extract_symbols(&self, parsed: &ParsedFile) -> Result<Vec<Symbol>, ParseError> {
        Ok(collect_symbols(parsed, get_queries()?, true))
    }

    fn extract_calls(&self, parsed: &ParsedFile) -> Result<Vec<Call>, ParseError> {
        Ok(collect_calls(parsed, get_queries()?))
    }
}
