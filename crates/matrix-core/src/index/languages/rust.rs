//! Rust extractor.

use tree_sitter::Node;

use crate::domain::code::SymbolKind;
use crate::index::parser::{
    ancestor_of_kind, named_children, node_text, position, walk, ExtractedImport, ExtractedSymbol,
    LanguageParser,
};

pub struct RustParser;

const SCOPE_KINDS: &[&str] = &["function_item", "impl_item", "mod_item", "trait_item"];

fn is_pub(node: Node) -> bool {
    named_children(node)
        .iter()
        .any(|c| c.kind() == "visibility_modifier")
}

fn scope_name(node: Node, source: &str) -> Option<String> {
    let ancestor = ancestor_of_kind(node, SCOPE_KINDS)?;
    let name_node = ancestor.child_by_field_name("name")?;
    Some(node_text(name_node, source).to_string())
}

fn signature_of(node: Node, source: &str) -> Option<String> {
    let params = node.child_by_field_name("parameters")?;
    let return_type = node
        .child_by_field_name("return_type")
        .map(|n| format!(" -> {}", node_text(n, source)))
        .unwrap_or_default();
    Some(format!("{}{}", node_text(params, source), return_type))
}

impl LanguageParser for RustParser {
    fn language(&self) -> tree_sitter::Language {
        tree_sitter_rust::language()
    }

    fn name(&self) -> &'static str {
        "rust"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn extract_symbols(&self, root: Node, source: &str, out: &mut Vec<ExtractedSymbol>) {
        walk(root, |node| {
            let kind = match node.kind() {
                "function_item" => Some(SymbolKind::Function),
                "struct_item" => Some(SymbolKind::Class),
                "enum_item" => Some(SymbolKind::Enum),
                "trait_item" => Some(SymbolKind::Interface),
                "type_item" => Some(SymbolKind::Type),
                "const_item" | "static_item" => Some(SymbolKind::Const),
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
                exported: is_pub(node),
                is_default: false,
                scope: scope_name(node, source),
                signature: signature_of(node, source),
            });
            true
        });
    }

    fn extract_imports(&self, root: Node, source: &str, out: &mut Vec<ExtractedImport>) {
        walk(root, |node| {
            if node.kind() != "use_declaration" {
                return true;
            }
            let (line, _, _) = position(node);
            let text = node_text(node, source);
            let path = text
                .trim_start_matches("pub")
                .trim()
                .trim_start_matches("use")
                .trim()
                .trim_end_matches(';')
                .to_string();
            let is_namespace = path.ends_with("::*");
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_pub_function_and_struct() {
        let parser = RustParser;
        let result = parser.parse(
            "pub fn greet(name: &str) -> String { name.to_string() }\nstruct Inner { x: i32 }",
        );
        assert_eq!(result.symbols.len(), 2);
        assert_eq!(result.symbols[0].name, "greet");
        assert!(result.symbols[0].exported);
        assert_eq!(result.symbols[0].kind, SymbolKind::Function);
        assert!(!result.symbols[1].exported);
    }

    #[test]
    fn extracts_use_declaration() {
        let parser = RustParser;
        let result = parser.parse("use std::collections::HashMap;\nfn f() {}");
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].source_path, "std::collections::HashMap");
    }
}
