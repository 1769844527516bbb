//! Symbol and call-site records extracted from source files.
//!
//! Offsets are byte offsets into the owning file's text. Records are plain
//! values owned by whoever holds the scan; re-scanning a file replaces them.

use serde::{Deserialize, Serialize};

/// The kind of top-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// A function (or C++ member function) definition.
    Function,
    /// A struct, union, enum, class, typedef, or alias definition.
    Type,
}

impl SymbolKind {
    /// Returns the string representation used in output.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Type => "type",
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named declaration extracted from source code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// The declared name (last segment for qualified C++ names).
    pub name: String,

    /// Function or type.
    pub kind: SymbolKind,

    /// Byte offset of the name within the file.
    pub offset: usize,

    /// Byte offset one past the end of the whole declaration.
    pub end_offset: usize,

    /// Line of the name (1-indexed).
    pub line: usize,

    /// Enclosing C++ scope (e.g. `ns::Outer`), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Symbol {
    /// Create a new symbol with no scope.
    pub fn new(
        name: impl Into<String>,
        kind: SymbolKind,
        offset: usize,
        end_offset: usize,
        line: usize,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            offset,
            end_offset,
            line,
            scope: None,
        }
    }

    /// Set the enclosing scope. Empty scopes are ignored.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        if !scope.is_empty() {
            self.scope = Some(scope);
        }
        self
    }

    /// Fully qualified name (`scope::name`, or just `name`).
    pub fn qualified_name(&self) -> String {
        match &self.scope {
            Some(scope) => format!("{}::{}", scope, self.name),
            None => self.name.clone(),
        }
    }

    /// Whether the symbol's extent fits inside a text of `len` bytes.
    pub fn is_within(&self, len: usize) -> bool {
        self.offset < len && self.offset <= self.end_offset && self.end_offset <= len
    }
}

/// A call site found in source code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// The called name (last segment for qualified calls).
    pub callee: String,
    /// Byte offset of the callee name.
    pub offset: usize,
    /// Line number (1-indexed).
    pub line: usize,
    /// Whether this call goes through `.` or `->`.
    pub is_method: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_kind_as_str() {
        assert_eq!(SymbolKind::Function.as_str(), "function");
        assert_eq!(SymbolKind::Type.as_str(), "type");
        assert_eq!(SymbolKind::Type.to_string(), "type");
    }

    #[test]
    fn test_symbol_creation() {
        let sym = Symbol::new("greet", SymbolKind::Function, 24, 80, 3);
        assert_eq!(sym.name, "greet");
        assert_eq!(sym.kind, SymbolKind::Function);
        assert_eq!(sym.scope, None);
        assert_eq!(sym.qualified_name(), "greet");
    }

    #[test]
    fn test_symbol_scope() {
        let sym = Symbol::new("greet", SymbolKind::Function, 0, 10, 1).with_scope("app::Greeter");
        assert_eq!(sym.qualified_name(), "app::Greeter::greet");

        let unscoped = Symbol::new("main", SymbolKind::Function, 0, 10, 1).with_scope("");
        assert_eq!(unscoped.scope, None);
    }

    #[test]
    fn test_symbol_bounds() {
        let sym = Symbol::new("f", SymbolKind::Function, 4, 20, 1);
        assert!(sym.is_within(20));
        assert!(sym.is_within(100));
        assert!(!sym.is_within(19));
        assert!(!sym.is_within(4));
    }

    #[test]
    fn test_symbol_serialization() {
        let sym = Symbol::new("Point", SymbolKind::Type, 7, 30, 1);
        let json = serde_json::to_string(&sym).expect("serialize");
        assert!(json.contains("\"kind\":\"type\""));
        assert!(!json.contains("scope"), "unscoped symbols omit scope");

        let back: Symbol = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, sym);
    }

    #[test]
    fn test_call_serialization() {
        let call = Call {
            callee: "printf".to_string(),
            offset: 40,
            line: 4,
            is_method: false,
        };
        let json = serde_json::to_string(&call).expect("serialize");
        let back: Call = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, call);
    }
}
