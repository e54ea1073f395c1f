//! Kotlin extractor.

use tree_sitter::Node;

use crate::domain::code::SymbolKind;
use crate::index::parser::{
    ancestor_of_kind, node_text, position, walk, ExtractedImport, ExtractedSymbol, LanguageParser,
};

pub struct KotlinParser;

const SCOPE_KINDS: &[&str] = &["class_declaration", "object_declaration"];

fn is_private(node: Node, source: &str) -> bool {
    node.prev_sibling()
        .is_some_and(|s| s.kind() == "modifiers" && node_text(s, source).contains("private"))
}

fn scope_name(node: Node, source: &str) -> Option<String> {
    let ancestor = ancestor_of_kind(node, SCOPE_KINDS)?;
    let name_node = ancestor.child_by_field_name("name")?;
    Some(node_text(name_node, source).to_string())
}

impl LanguageParser for KotlinParser {
    fn language(&self) -> tree_sitter::Language {
        tree_sitter_kotlin_ng::language()
    }

    fn name(&self) -> &'static str {
        "kotlin"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["kt", "kts"]
    }

    fn extract_symbols(&self, root: Node, source: &str, out: &mut Vec<ExtractedSymbol>) {
        walk(root, |node| {
            let kind = match node.kind() {
                "function_declaration" => Some(SymbolKind::Function),
                "class_declaration" => Some(SymbolKind::Class),
                "object_declaration" => Some(SymbolKind::Class),
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
                exported: !is_private(node, source),
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
            if node.kind() != "import" {
                return true;
            }
            let (line, _, _) = position(node);
            let text = node_text(node, source)
                .trim_start_matches("import")
                .trim()
                .to_string();
            let is_namespace = text.ends_with(".*");
            out.push(ExtractedImport {
                imported_name: text.clone(),
                local_name: None,
                source_path: text,
                is_default: false,
                is_namespace,
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
    fn extracts_top_level_function() {
        let parser = KotlinParser;
        let result = parser.parse("fun greet(): String = \"hi\"\n");
        assert_eq!(result.symbols.len(), 1);
        assert_eq!(result.symbols[0].kind, SymbolKind::Function);
    }
}
