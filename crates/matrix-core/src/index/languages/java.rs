//! Java extractor.

use tree_sitter::Node;

use crate::domain::code::SymbolKind;
use crate::index::parser::{
    ancestor_of_kind, named_children, node_text, position, walk, ExtractedImport, ExtractedSymbol,
    LanguageParser,
};

pub struct JavaParser;

const SCOPE_KINDS: &[&str] = &["class_declaration", "interface_declaration", "enum_declaration"];

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

impl LanguageParser for JavaParser {
    fn language(&self) -> tree_sitter::Language {
        tree_sitter_java::language()
    }

    fn name(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn extract_symbols(&self, root: Node, source: &str, out: &mut Vec<ExtractedSymbol>) {
        walk(root, |node| {
            let kind = match node.kind() {
                "class_declaration" => Some(SymbolKind::Class),
                "interface_declaration" => Some(SymbolKind::Interface),
                "enum_declaration" => Some(SymbolKind::Enum),
                "method_declaration" => Some(SymbolKind::Method),
                "constructor_declaration" => Some(SymbolKind::Method),
                _ => None,
            };
            let Some(kind) = kind else { return true };
            let Some(name_node) = node.child_by_field_name("name") else {
                return true;
            };
            let (line, column, end_line) = position(node);
            let signature = node
                .child_by_field_name("parameters")
                .map(|p| node_text(p, source).to_string());
            out.push(ExtractedSymbol {
                name: node_text(name_node, source).to_string(),
                kind,
                line: line + 1,
                column,
                end_line: Some(end_line + 1),
                exported: has_public_modifier(node, source),
                is_default: false,
                scope: scope_name(node, source),
                signature,
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
            let text = node_text(node, source);
            let is_namespace = text.contains(".*");
            let path = text
                .trim_start_matches("import")
                .trim_start_matches("static")
                .trim()
                .trim_end_matches(';')
                .to_string();
            out.push(ExtractedImport {
                imported_name: path.clone(),
                local_name: None,
                source_path: path,
                is_default: false,
                is_namespace,
                is_type: false,
                line: line + 1,
            });
            false
        });
    }
}
