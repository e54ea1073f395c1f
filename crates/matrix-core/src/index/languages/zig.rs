//! Zig extractor.

use tree_sitter::Node;

use crate::domain::code::SymbolKind;
use crate::index::parser::{node_text, position, walk, ExtractedImport, ExtractedSymbol, LanguageParser};

pub struct ZigParser;

fn is_pub(node: Node, source: &str) -> bool {
    node.prev_sibling()
        .is_some_and(|s| s.kind() == "visibility_modifier" || node_text(s, source) == "pub")
}

impl LanguageParser for ZigParser {
    fn language(&self) -> tree_sitter::Language {
        tree_sitter_zig::language()
    }

    fn name(&self) -> &'static str {
        "zig"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["zig"]
    }

    fn extract_symbols(&self, root: Node, source: &str, out: &mut Vec<ExtractedSymbol>) {
        walk(root, |node| {
            if node.kind() != "function_declaration" {
                return true;
            }
            let Some(name_node) = node.child_by_field_name("name") else {
                return true;
            };
            let (line, column, end_line) = position(node);
            out.push(ExtractedSymbol {
                name: node_text(name_node, source).to_string(),
                kind: SymbolKind::Function,
                line: line + 1,
                column,
                end_line: Some(end_line + 1),
                exported: is_pub(node, source),
                is_default: false,
                scope: None,
                signature: node
                    .child_by_field_name("parameters")
                    .map(|p| node_text(p, source).to_string()),
            });
            true
        });
    }

    fn extract_imports(&self, root: Node, source: &str, out: &mut Vec<ExtractedImport>) {
        walk(root, |node| {
            if node.kind() != "call_expression" && node.kind() != "builtin_call" {
                return true;
            }
            let Some(function) = node.child_by_field_name("function") else {
                return true;
            };
            if node_text(function, source) != "@import" {
                return true;
            }
            let Some(args) = node.child_by_field_name("arguments") else {
                return true;
            };
            let Some(arg) = args.named_child(0) else {
                return true;
            };
            let (line, _, _) = position(node);
            let path = node_text(arg, source).trim_matches('"').to_string();
            out.push(ExtractedImport {
                imported_name: path.clone(),
                local_name: None,
                source_path: path,
                is_default: false,
                is_namespace: false,
                is_type: false,
                line: line + 1,
            });
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_pub_function() {
        let parser = ZigParser;
        let result = parser.parse("pub fn add(a: i32, b: i32) i32 {\n    return a + b;\n}\n");
        assert_eq!(result.symbols.len(), 1);
        assert!(result.symbols[0].exported);
    }
}
