//! §4.9: the template-method parser base shared by every language.
//!
//! A [`LanguageParser`] supplies the two language-specific visitors;
//! everything else — loading the grammar, running tree-sitter, walking the
//! tree, and the position/ancestor helpers — lives here.

use tree_sitter::{Node, Parser, Tree};

use crate::domain::code::SymbolKind;

/// One symbol found by [`LanguageParser::extract_symbols`], prior to being
/// assigned a `repo_id`/`file_id` by the indexer pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub line: i64,
    pub column: i64,
    pub end_line: Option<i64>,
    pub exported: bool,
    pub is_default: bool,
    pub scope: Option<String>,
    pub signature: Option<String>,
}

/// One import found by [`LanguageParser::extract_imports`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedImport {
    pub imported_name: String,
    pub local_name: Option<String>,
    pub source_path: String,
    pub is_default: bool,
    pub is_namespace: bool,
    pub is_type: bool,
    pub line: i64,
}

/// The result of parsing one file: whatever was extracted, plus a non-fatal
/// error if the parse was partial (§4.9 "Parser errors").
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub symbols: Vec<ExtractedSymbol>,
    pub imports: Vec<ExtractedImport>,
    pub error: Option<String>,
}

/// The contract every language extractor implements.
pub trait LanguageParser: Send + Sync {
    /// The tree-sitter grammar for this language, compiled into the binary.
    fn language(&self) -> tree_sitter::Language;

    /// Canonical lowercase language name, used as the grammar-cache key and
    /// in diagnostics (e.g. `"typescript"`, `"csharp"`).
    fn name(&self) -> &'static str;

    /// File extensions this parser claims, lowercase, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Visit `root` and append every definition found to `out`.
    fn extract_symbols(&self, root: Node, source: &str, out: &mut Vec<ExtractedSymbol>);

    /// Visit `root` and append every import found to `out`.
    fn extract_imports(&self, root: Node, source: &str, out: &mut Vec<ExtractedImport>);

    /// Parse `content` and run both extractors. The template method: it is
    /// the same for every language and subclasses never override it.
    fn parse(&self, content: &str) -> ParseResult {
        let mut parser = Parser::new();
        if let Err(err) = parser.set_language(&self.language()) {
            return ParseResult {
                error: Some(format!("grammar load failed: {err}")),
                ..Default::default()
            };
        }

        let Some(tree) = parser.parse(content, None) else {
            return ParseResult {
                error: Some("tree-sitter failed to produce a tree".to_string()),
                ..Default::default()
            };
        };

        let mut result = ParseResult::default();
        let root = tree.root_node();
        self.extract_symbols(root, content, &mut result.symbols);
        self.extract_imports(root, content, &mut result.imports);

        if root.has_error() {
            result.error = Some("source contains syntax errors; partial result kept".to_string());
        }

        result
    }
}

/// `(start_line, start_column, end_line)`, all zero-based as tree-sitter
/// reports them; callers add one where the schema expects 1-based lines.
#[must_use]
pub fn position(node: Node) -> (i64, i64, i64) {
    let start = node.start_position();
    let end = node.end_position();
    (start.row as i64, start.column as i64, end.row as i64)
}

/// The UTF-8 text covered by `node`, or an empty string if `source` isn't
/// valid for this node's byte range.
#[must_use]
pub fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Named children of `node` (skips anonymous/punctuation nodes).
#[must_use]
pub fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Walk up from `node` looking for the nearest ancestor whose kind is one of
/// `kinds`; used to compute a symbol's enclosing `scope`.
#[must_use]
pub fn ancestor_of_kind<'a>(node: Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
    let mut current = node.parent();
    while let Some(n) = current {
        if kinds.contains(&n.kind()) {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

/// Depth-first visitor over every descendant of `root`, in the order
/// tree-sitter yields named children. `visit` returns `false` to prune the
/// subtree rooted at the node it was just given.
pub fn walk(root: Node, mut visit: impl FnMut(Node) -> bool) {
    fn recurse<'a>(node: Node<'a>, visit: &mut impl FnMut(Node<'a>) -> bool) {
        if !visit(node) {
            return;
        }
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            recurse(child, visit);
        }
    }
    recurse(root, &mut visit);
}

/// Parse `content` with a throwaway parser for `language`; used by tests
/// that only need a [`Tree`] and don't go through a [`LanguageParser`].
#[cfg(test)]
#[must_use]
pub fn parse_with(language: &tree_sitter::Language, content: &str) -> Tree {
    let mut parser = Parser::new();
    parser.set_language(language).expect("valid grammar");
    parser.parse(content, None).expect("parse succeeds")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestor_of_kind_finds_enclosing_function() {
        let language = tree_sitter_rust::language();
        let tree = parse_with(&language, "fn outer() { let x = 1; }");
        let root = tree.root_node();
        let mut found = None;
        walk(root, |n| {
            if n.kind() == "integer_literal" {
                found = ancestor_of_kind(n, &["function_item"]);
            }
            true
        });
        assert!(found.is_some());
        assert_eq!(found.unwrap().kind(), "function_item");
    }

    #[test]
    fn position_is_zero_based() {
        let language = tree_sitter_rust::language();
        let tree = parse_with(&language, "fn f() {}");
        let (line, column, _) = position(tree.root_node());
        assert_eq!(line, 0);
        assert_eq!(column, 0);
    }
}
