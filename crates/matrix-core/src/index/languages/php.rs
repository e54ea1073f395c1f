//! PHP extractor.

use tree_sitter::Node;

use crate::domain::code::SymbolKind;
use crate::index::parser::{
    ancestor_of_kind, node_text, position, walk, ExtractedImport, ExtractedSymbol, LanguageParser,
};

pub struct PhpParser;

const SCOPE_KINDS: &[&str] = &["class_declaration", "interface_declaration"];

fn scope_name(node: Node, source: &str) -> Option<String> {
    let ancestor = ancestor_of_kind(node, SCOPE_KINDS)?;
    let name_node = ancestor.child_by_field_name("name")?;
    Some(node_text(name_node, source).to_string())
}

impl LanguageParser for PhpParser {
    fn language(&self) -> tree_sitter::Language {
        tree_sitter_php::language_php()
    }

    fn name(&self) -> &'static str {
        "php"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["php"]
    }

    fn extract_symbols(&self, root: Node, source: &str, out: &mut Vec<ExtractedSymbol>) {
        walk(root, |node| {
            let kind = match node.kind() {
                "function_definition" => Some(SymbolKind::Function),
                "method_declaration" => Some(SymbolKind::Method),
                "class_declaration" => Some(SymbolKind::Class),
                "interface_declaration" => Some(SymbolKind::Interface),
                _ => None,
            };
            let Some(kind) = kind else { return true };
            let Some(name_node) = node.child_by_field_name("name") else {
                return true;
            };
            let (line, column, end_line) = position(node);
            out.push(ExtractedSymbol {
                name: node_text(name_node, source).to_string(),
                kind,
                line: line + 1,
                column,
                end_line: Some(end_line + 1),
                exported: true,
                is_default: false,
                scope: scope_name(node, source),
                signature: node
                    .child_by_field_name("parameters")
                    .map(|p| node_text(p, source).to_string()),
            });
            true
        });
    }

    fn extract_imports(&self, root: Node, source: &str, out: &mut Vec<ExtractedImport>) {
        walk(root, |node| {
            if node.kind() != "namespace_use_declaration" {
                return true;
            }
            let (line, _, _) = position(node);
            let text = node_text(node, source);
            let path = text
                .trim_start_matches("use")
                .trim()
                .trim_end_matches(';')
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
    fn extracts_class_and_method() {
        let parser = PhpParser;
        let result =
            parser.parse("<?php\nclass Greeter {\n  function hello() { return 'hi'; }\n}\n");
        assert_eq!(result.symbols.len(), 2);
    }
}
