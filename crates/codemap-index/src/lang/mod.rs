//! Language-specific extractors.
//!
//! Each language module supplies tree-sitter queries for definitions and
//! call sites. The capture names are shared, so the walking logic below
//! serves both grammars:
//!
//! - `@function`: a `function_definition` node
//! - `@type`: a specifier or alias with a `name` field
//! - `@typedef`: a `type_definition` whose declarators carry the names
//! - `@callee`: the `function` child of a call expression
//! - `@constructed`: the `type` child of a C++ `new` expression

pub mod c;
pub mod cpp;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};

use crate::parser::{Language, ParseError, ParsedFile};
use crate::symbols::{Call, Symbol, SymbolKind};

pub use c::CExtractor;
pub use cpp::CppExtractor;

/// Extraction for one grammar.
pub trait LanguageExtractor: Send + Sync {
    /// The language this extractor handles.
    fn language(&self) -> Language;

    /// Definitions in source order.
    fn extract_symbols(&self, parsed: &ParsedFile) -> Result<Vec<Symbol>, ParseError>;

    /// Call sites in source order.
    fn extract_calls(&self, parsed: &ParsedFile) -> Result<Vec<Call>, ParseError>;
}

/// Get the extractor for a language. `Unknown` has none.
pub fn extractor_for(language: Language) -> Option<&'static dyn LanguageExtractor> {
    match language {
        Language::C => Some(&CExtractor),
        Language::Cpp => Some(&CppExtractor),
        Language::Unknown => None,
    }
}

/// Compiled queries for one language.
pub(crate) struct LanguageQueries {
    symbols: Query,
    calls: Query,
}

impl LanguageQueries {
    pub(crate) fn new(
        language: &tree_sitter::Language,
        symbols: &str,
        calls: &str,
    ) -> Result<Self, String> {
        let symbols = Query::new(language, symbols)
            .map_err(|e| format!("Failed to compile symbols query: {e}"))?;
        let calls =
            Query::new(language, calls).map_err(|e| format!("Failed to compile calls query: {e}"))?;
        Ok(Self { symbols, calls })
    }
}

/// Run the symbols query and turn captures into symbols.
///
/// `scoped` enables C++ scope tracking (classes, namespaces, qualified names).
pub(crate) fn collect_symbols(
    parsed: &ParsedFile,
    queries: &LanguageQueries,
    scoped: bool,
) -> Vec<Symbol> {
    let query = &queries.symbols;
    let mut symbols = Vec::new();

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, parsed.root_node(), parsed.source);

    while let Some(match_) = matches.next() {
        for capture in match_.captures {
            let node = capture.node;

            // Local definitions inside function bodies are not top-level
            if inside_function(node) {
                continue;
            }

            match query.capture_names()[capture.index as usize] {
                "function" => symbols.extend(function_symbol(parsed, node, scoped)),
                "type" => symbols.extend(type_symbol(parsed, node, scoped)),
                "typedef" => symbols.extend(typedef_symbols(parsed, node, scoped)),
                _ => {}
            }
        }
    }

    symbols.sort_by_key(|s| s.offset);
    symbols.dedup_by(|a, b| a.offset == b.offset && a.kind == b.kind);
    symbols
}

/// Run the calls query and turn captures into call sites.
pub(crate) fn collect_calls(parsed: &ParsedFile, queries: &LanguageQueries) -> Vec<Call> {
    let query = &queries.calls;
    let mut calls = Vec::new();

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, parsed.root_node(), parsed.source);

    while let Some(match_) = matches.next() {
        for capture in match_.captures {
            let target = match query.capture_names()[capture.index as usize] {
                "callee" | "constructed" => call_target(capture.node),
                _ => None,
            };

            if let Some((node, is_method)) = target {
                calls.push(Call {
                    callee: parsed.node_text(node),
                    offset: node.start_byte(),
                    line: node.start_position().row + 1,
                    is_method,
                });
            }
        }
    }

    calls.sort_by_key(|c| c.offset);
    calls.dedup_by(|a, b| a.offset == b.offset);
    calls
}

fn function_symbol(parsed: &ParsedFile, node: Node, scoped: bool) -> Option<Symbol> {
    let (name_node, qualifier) =
        unqualify(parsed, function_name(node.child_by_field_name("declarator")?)?);

    let name = if name_node.kind() == "operator_cast" {
        operator_cast_name(parsed, name_node)?
    } else {
        parsed.node_text(name_node)
    };
    if name.is_empty() {
        return None;
    }

    let symbol = Symbol::new(
        name,
        SymbolKind::Function,
        name_node.start_byte(),
        node.end_byte(),
        name_node.start_position().row + 1,
    );

    Some(if scoped {
        symbol.with_scope(join_scope(enclosing_scope(parsed, node), qualifier))
    } else {
        symbol
    })
}

fn type_symbol(parsed: &ParsedFile, node: Node, scoped: bool) -> Option<Symbol> {
    let (name_node, qualifier) = unqualify(parsed, node.child_by_field_name("name")?);

    let symbol = Symbol::new(
        parsed.node_text(name_node),
        SymbolKind::Type,
        name_node.start_byte(),
        node.end_byte(),
        name_node.start_position().row + 1,
    );

    Some(if scoped {
        symbol.with_scope(join_scope(enclosing_scope(parsed, node), qualifier))
    } else {
        symbol
    })
}

fn typedef_symbols(parsed: &ParsedFile, node: Node, scoped: bool) -> Vec<Symbol> {
    let mut cursor = node.walk();
    let declarators: Vec<Node> = node
        .children_by_field_name("declarator", &mut cursor)
        .collect();

    let scope = if scoped {
        enclosing_scope(parsed, node)
    } else {
        None
    };

    declarators
        .into_iter()
        .filter_map(type_declarator_name)
        .map(|name_node| {
            let symbol = Symbol::new(
                parsed.node_text(name_node),
                SymbolKind::Type,
                name_node.start_byte(),
                node.end_byte(),
                name_node.start_position().row + 1,
            );
            match &scope {
                Some(scope) => symbol.with_scope(scope.clone()),
                None => symbol,
            }
        })
        .collect()
}

/// Descend a function definition's declarator to the (possibly qualified)
/// name being defined.
///
/// A function returning a function pointer nests the named function
/// declarator inside the outer one, e.g. `int (*f(int))(int)`, so descent
/// continues until a function declarator wraps a name. Conversion operators
/// have no function declarator; their `operator_cast` node is the name.
fn function_name(mut node: Node) -> Option<Node> {
    let mut in_function = false;
    loop {
        match node.kind() {
            "operator_cast" => return Some(node),
            "qualified_identifier" if in_function || is_operator_cast(node) => return Some(node),
            "identifier" | "field_identifier" | "destructor_name" | "operator_name"
            | "template_function" | "template_method"
                if in_function =>
            {
                return Some(node);
            }
            "function_declarator" => {
                in_function = true;
                node = node.child_by_field_name("declarator")?;
            }
            _ => node = inner_declarator(node)?,
        }
    }
}

/// Whether a qualified name ends in a conversion operator (`A::operator bool`).
fn is_operator_cast(node: Node) -> bool {
    let mut current = node;
    while let Some(name) = current.child_by_field_name("name") {
        current = name;
    }
    current.kind() == "operator_cast"
}

/// `operator T` for a conversion operator: the text up to its parameter list,
/// with whitespace collapsed.
fn operator_cast_name(parsed: &ParsedFile, node: Node) -> Option<String> {
    let mut current = node.child_by_field_name("declarator")?;
    while current.kind() != "abstract_function_declarator" {
        current = current.child_by_field_name("declarator")?;
    }
    let params = current.child_by_field_name("parameters")?;

    let text = String::from_utf8_lossy(&parsed.source[node.start_byte()..params.start_byte()]);
    Some(text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Descend a typedef declarator to the introduced type name.
fn type_declarator_name(mut node: Node) -> Option<Node> {
    loop {
        if node.kind() == "type_identifier" {
            return Some(node);
        }
        node = inner_declarator(node)?;
    }
}

/// The wrapped declarator: the `declarator` field if present, otherwise the
/// last named child (reference and parenthesized declarators have no field).
fn inner_declarator(node: Node) -> Option<Node> {
    if let Some(inner) = node.child_by_field_name("declarator") {
        return Some(inner);
    }
    if !node.kind().ends_with("declarator") {
        return None;
    }
    let mut cursor = node.walk();
    let last = node.named_children(&mut cursor).last();
    last
}

/// Strip C++ qualification and template arguments from a name node.
///
/// Returns the bare name node and the qualifier text (`a::b` for `a::b::f`).
fn unqualify<'tree>(parsed: &ParsedFile, mut node: Node<'tree>) -> (Node<'tree>, Option<String>) {
    let mut segments = Vec::new();

    loop {
        match node.kind() {
            "qualified_identifier" => {
                if let Some(scope) = node.child_by_field_name("scope") {
                    segments.push(parsed.node_text(scope));
                }
                match node.child_by_field_name("name") {
                    Some(name) => node = name,
                    None => break,
                }
            }
            "template_function" | "template_type" | "template_method" => {
                match node.child_by_field_name("name") {
                    Some(name) => node = name,
                    None => break,
                }
            }
            _ => break,
        }
    }

    let qualifier = (!segments.is_empty()).then(|| segments.join("::"));
    (node, qualifier)
}

/// Resolve the called name from a call's `function` or a `new` type.
fn call_target(node: Node) -> Option<(Node, bool)> {
    match node.kind() {
        "identifier" | "type_identifier" => Some((node, false)),
        "field_expression" => {
            let field = node.child_by_field_name("field")?;
            let field = match field.kind() {
                "template_method" => field.child_by_field_name("name")?,
                _ => field,
            };
            (field.kind() == "field_identifier").then_some((field, true))
        }
        "qualified_identifier" | "template_function" | "template_type" => {
            let mut current = node;
            while let Some(name) = current.child_by_field_name("name") {
                current = name;
            }
            matches!(current.kind(), "identifier" | "type_identifier").then_some((current, false))
        }
        _ => None,
    }
}

/// Names of enclosing classes, structs, unions and namespaces, outermost first.
fn enclosing_scope(parsed: &ParsedFile, node: Node) -> Option<String> {
    let mut segments = Vec::new();
    let mut current = node.parent();

    while let Some(parent) = current {
        if matches!(
            parent.kind(),
            "class_specifier" | "struct_specifier" | "union_specifier" | "namespace_definition"
        ) {
            if let Some(name) = parent.child_by_field_name("name") {
                segments.push(parsed.node_text(name));
            }
        }
        current = parent.parent();
    }

    if segments.is_empty() {
        return None;
    }
    segments.reverse();
    Some(segments.join("::"))
}

fn join_scope(enclosing: Option<String>, qualifier: Option<String>) -> String {
    match (enclosing, qualifier) {
        (Some(outer), Some(inner)) => format!("{outer}::{inner}"),
        (Some(scope), None) | (None, Some(scope)) => scope,
        (None, None) => String::new(),
    }
}

fn inside_function(node: Node) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if parent.kind() == "function_definition" {
            return true;
        }
        current = parent.parent();
    }
    false
}
