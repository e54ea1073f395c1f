//! C# extractor.

use tree_sitter::Node;

use crate::domain::code::SymbolKind;
use crate::index::parser::{
    ancestor_of_kind, named_children, node_text, position, walk, ExtractedImport, ExtractedSymbol,
    LanguageParser,
};

pub struct CSharpParser;

const SCOPE_KINDS: &[&str] = &["class_declaration", "interface_declaration", "struct_declaration"];

fn has_public_modifier(node: Node, source: &str) -> bool {
    named_children(node)
        .iter()
        .any(|c| c.kind() == "modifier" && node_text(*c, source) == "public")
}

fn scope_name(node: Node, source: &str) -> Option<String> {
    let ancestor = ancestor_of_kind(node, SCOPE_KINDS)?;
    let name_node = ancestor.child_by_field_name("name")?;
    Some(node_text(name_node, source).to_string())
}

impl LanguageParser for CSharpParser {
    fn language(&self) -> tree_sitter::Language {
        tree_sitter_c_sharp::language()
    }

    fn name(&self) -> &'static str {
        "csharp"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["cs"]
    }

    fn extract_symbols(&self, root: Node, source: &str, out: &mut Vec<ExtractedSymbol>) {
        walk(root, |node| {
            let kind = match node.kind() {
                "class_declaration" => Some(SymbolKind::Class),
                "interface_declaration" => Some(SymbolKind::Interface),
                "struct_declaration" => Some(SymbolKind::Class),
                "enum_declaration" => Some(SymbolKind::Enum),
                "method_declaration" => Some(SymbolKind::Method),
                "property_declaration" => Some(SymbolKind::Property),
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
            if node.kind() != "using_directive" {
                return true;
            }
            let (line, _, _) = position(node);
            let name_node = node.child_by_field_name("name");
            let Some(name_node) = name_node else { return true };
            let path = node_text(name_node, source).to_string();
            let alias = node.child_by_field_name("alias").map(|n| node_text(n, source).to_string());
            out.push(ExtractedImport {
                imported_name: path.clone(),
                local_name: alias,
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
    fn extracts_public_class_and_method() {
        let parser = CSharpParser;
        let result =
            parser.parse("public class Greeter {\n  public string Greet() { return \"hi\"; }\n}\n");
        assert_eq!(result.symbols.len(), 2);
        assert!(result.symbols[0].exported);
    }

    #[test]
    fn extracts_using_directive() {
        let parser = CSharpParser;
        let result = parser.parse("using System.Collections.Generic;\nclass C {}\n");
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].source_path, "System.Collections.Generic");
    }
}
