//! C symbol extraction.
//!
//! Definitions only: functions with bodies, named struct/union/enum
//! specifiers with bodies, and typedefs. Prototypes and forward
//! declarations are skipped.

use std::sync::OnceLock;

use super::{LanguageExtractor, LanguageQueries, collect_calls, collect_symbols};
use crate::parser::{Language, ParseError, ParsedFile};
use crate::symbols::{Call, Symbol};

/// Tree-sitter query for C definitions.
const SYMBOLS_QUERY: &str = r#"
; Functions
(function_definition) @function

; Structs
(struct_specifier
  name: (type_identifier)
  body: (field_declaration_list)) @type

; Unions
(union_specifier
  name: (type_identifier)
  body: (field_declaration_list)) @type

; Enums
(enum_specifier
  name: (type_identifier)
  body: (enumerator_list)) @type

; Typedefs
(type_definition) @typedef
"#;

/// Tree-sitter query for C call sites.
const CALLS_QUERY: &str = r#"
(call_expression
  function: (_) @callee) @call
"#;

static C_QUERIES: OnceLock<Result<LanguageQueries, String>> = OnceLock::new();

fn get_queries() -> Result<&'static LanguageQueries, ParseError> {
    C_QUERIES
        .get_or_init(|| {
            let language = tree_sitter_c::LANGUAGE.into();
            LanguageQueries::new(&language, SYMBOLS_QUERY, CALLS_QUERY)
        })
        .as_ref()
        .map_err(|e| ParseError::QueryError(e.clone()))
}

/// C symbol extractor.
pub struct CExtractor;

impl LanguageExtractor for CExtractor {
    fn language(&self) -> Language {
        Language::C
    }

    fn extract_symbols(&self, parsed: &ParsedFile) -> Result<Vec<Symbol>, ParseError> {
        Ok(collect_symbols(parsed, get_queries()?, false))
    }

    fn extract_calls(&self, parsed: &ParsedFile) -> Result<Vec<Call>, ParseError> {
        Ok(collect_calls(parsed, get_queries()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::symbols::SymbolKind;

    fn symbols(source: &str) -> Vec<Symbol> {
        let mut parser = Parser::new();
        let parsed = parser.parse_bytes(source.as_bytes(), Language::C).unwrap();
        CExtractor.extract_symbols(&parsed).unwrap()
    }

    fn calls(source: &str) -> Vec<Call> {
        let mut parser = Parser::new();
        let parsed = parser.parse_bytes(source.as_bytes(), Language::C).unwrap();
        CExtractor.extract_calls(&parsed).unwrap()
    }

    fn names(symbols: &[Symbol]) -> Vec<&str> {
        symbols.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_extract_functions() {
        let source = r#"
#include <stdio.h>

void greet(void) {
    printf("Hello, World!\n");
}

int main(void) {
    greet();
    return 0;
}
"#;
        let symbols = symbols(source);
        assert_eq!(names(&symbols), vec!["greet", "main"]);
        assert!(symbols.iter().all(|s| s.kind == SymbolKind::Function));
        assert!(symbols.iter().all(|s| s.scope.is_none()));

        let greet = &symbols[0];
        assert_eq!(&source[greet.offset..greet.offset + 5], "greet");
        assert_eq!(greet.line, 4);
    }

    #[test]
    fn test_prototypes_are_skipped() {
        let source = "int add(int a, int b);\nint add(int a, int b) { return a + b; }\n";
        let symbols = symbols(source);
        assert_eq!(names(&symbols), vec!["add"]);
        assert_eq!(symbols[0].line, 2);
    }

    #[test]
    fn test_pointer_returning_functions() {
        let source = r#"
char *dup(const char *s) { return 0; }
char **split(const char *s) { return 0; }
"#;
        assert_eq!(names(&symbols(source)), vec!["dup", "split"]);
    }

    #[test]
    fn test_function_pointer_returning_functions() {
        let source = r#"
int (*get_handler(int sig))(int) { return 0; }
void (*install(int sig, void (*fn)(int)))(int) { return fn; }
"#;
        let symbols = symbols(source);
        assert_eq!(names(&symbols), vec!["get_handler", "install"]);
        assert!(symbols.iter().all(|s| s.kind == SymbolKind::Function));
        assert_eq!(&source[symbols[0].offset..symbols[0].offset + 11], "get_handler");
    }

    #[test]
    fn test_extract_types() {
        let source = r#"
struct Point { int x; int y; };
union Value { int i; float f; };
enum Color { RED, GREEN };
struct Forward;
typedef unsigned long size_type;
typedef struct { int w; int h; } Size;
"#;
        let symbols = symbols(source);
        assert_eq!(
            names(&symbols),
            vec!["Point", "Value", "Color", "size_type", "Size"]
        );
        assert!(symbols.iter().all(|s| s.kind == SymbolKind::Type));
    }

    #[test]
    fn test_typedef_struct_yields_both_names() {
        let source = r#"
typedef struct Greeter {
    void (*greet)(const char* name);
} Greeter;
"#;
        let symbols = symbols(source);
        assert_eq!(names(&symbols), vec!["Greeter", "Greeter"]);
        assert!(symbols[0].offset < symbols[1].offset);
    }

    #[test]
    fn test_function_pointer_typedef() {
        let symbols = symbols("typedef int (*compare_fn)(const void *, const void *);\n");
        assert_eq!(names(&symbols), vec!["compare_fn"]);
        assert_eq!(symbols[0].kind, SymbolKind::Type);
    }

    #[test]
    fn test_local_types_are_not_top_level() {
        let source = r#"
int run(void) {
    struct Local { int v; } l = { 1 };
    return l.v;
}
"#;
        assert_eq!(names(&symbols(source)), vec!["run"]);
    }

    #[test]
    fn test_extract_calls() {
        let source = r#"
int main(void) {
    Greeter *g = create_greeter();
    g->greet("World");
    free(g);
    return 0;
}
"#;
        let calls = calls(source);
        let callees: Vec<_> = calls.iter().map(|c| (c.callee.as_str(), c.is_method)).collect();
        assert_eq!(
            callees,
            vec![("create_greeter", false), ("greet", true), ("free", false)]
        );
    }

    #[test]
    fn test_empty_source() {
        assert!(symbols("").is_empty());
        assert!(calls("").is_empty());
    }
}
