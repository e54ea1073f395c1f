//! Swift extractor.

use tree_sitter::Node;

use crate::domain::code::SymbolKind;
use crate::index::parser::{
    ancestor_of_kind, named_children, node_text, position, walk, ExtractedImport, ExtractedSymbol,
    LanguageParser,
};

pub struct SwiftParser;

const SCOPE_KINDS: &[&str] = &["class_declaration", "protocol_declaration"];

fn has_public_modifier(node: Node, source: &str) -> bool {
    named_children(node)
        .iter()
        .any(|c| c.kind() == "modifiers" && node_text(*c, source).contains("public"))
}

fn scope_name(node: Node, source: &str) -> Option<String> {
    let ancestor = ancestor_of_kind(node, SCOPE_KINDS)?;
    let name_node = ancestor.child_by_field_name("name")?;
    Some(node_text(name_node, source).to_string())
}

impl LanguageParser for SwiftParser {
    fn language(&self) -> tree_sitter::Language {
        tree_sitter_swift::language()
    }

    fn name(&self) -> &'static str {
        "swift"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["swift"]
    }

    fn extract_symbols(&self, root: Node, source: &str, out: &mut Vec<ExtractedSymbol>) {
        walk(root, |node| {
            let kind = match node.kind() {
                "function_declaration" => Some(SymbolKind::Function),
                "class_declaration" => Some(SymbolKind::Class),
                "protocol_declaration" => Some(SymbolKind::Interface),
                _ => None,
            };
            let Some(kind) = kind else { return true };
            let Some(name_node) = node.child_by_field_name("name") else {
                return true;
            };
            let scope = scope_name(node, source);
            let kind = if kind == SymbolKind::Function && scope.is_some() {
                SymbolKind::Method
            } else {
                kind
            };
            let (line, column, end_line) = position(node);
            out.push(ExtractedSymbol {
                name: node_text(name_node, source).to_string(),
                kind,
                line: line + 1,
                column,
                end_line: Some(end_line + 1),
                exported: has_public_modifier(node, source),
                is_default: false,
                scope,
                signature: node
                    .child_by_field_name("parameters")
                    .map(|p| node_text(p, source).to_string()),
            });
            true
        });
    }

    fn extract_imports(&self, root: Node, source: &str, out: &mut Vec<ExtractedImport>) {
        walk(root, |node| {
            if node.kind() != "import_declaration" {
                return true;
            }
            let (line, _, _) = position(node);
            let path = node_text(node, source)
                .trim_start_matches("import")
                .trim()
                .to_string();
            out.push(ExtractedImport {
                imported_name: path.clone(),
                local_name: None,
                source_path: path,
                is_default: false,
                is_namespace: false,
                is_type: false,
                line: line + 1,
            });
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_public_class() {
        let parser = SwiftParser;
        let result = parser.parse("public class Greeter {}\n");
        assert_eq!(result.symbols.len(), 1);
        assert!(result.symbols[0].exported);
    }
}
