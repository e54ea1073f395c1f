//! Ruby extractor.

use tree_sitter::Node;

use crate::domain::code::SymbolKind;
use crate::index::parser::{
    ancestor_of_kind, node_text, position, walk, ExtractedImport, ExtractedSymbol, LanguageParser,
};

pub struct RubyParser;

const SCOPE_KINDS: &[&str] = &["class", "module"];

fn scope_name(node: Node, source: &str) -> Option<String> {
    let ancestor = ancestor_of_kind(node, SCOPE_KINDS)?;
    let name_node = ancestor.child_by_field_name("name")?;
    Some(node_text(name_node, source).to_string())
}

impl LanguageParser for RubyParser {
    fn language(&self) -> tree_sitter::Language {
        tree_sitter_ruby::language()
    }

    fn name(&self) -> &'static str {
        "ruby"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rb"]
    }

    fn extract_symbols(&self, root: Node, source: &str, out: &mut Vec<ExtractedSymbol>) {
        walk(root, |node| {
            let kind = match node.kind() {
                "method" => Some(SymbolKind::Method),
                "class" => Some(SymbolKind::Class),
                "module" => Some(SymbolKind::Namespace),
                _ => None,
            };
            let Some(kind) = kind else { return true };
            let Some(name_node) = node.child_by_field_name("name") else {
                return true;
            };
            let name = node_text(name_node, source).to_string();
            let (line, column, end_line) = position(node);
            out.push(ExtractedSymbol {
                exported: !name.starts_with('_'),
                is_default: false,
                name,
                kind,
                line: line + 1,
                column,
                end_line: Some(end_line + 1),
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
            if node.kind() != "call" {
                return true;
            }
            let Some(method_node) = node.child_by_field_name("method") else {
                return true;
            };
            let method = node_text(method_node, source);
            if !matches!(method, "require" | "require_relative") {
                return true;
            }
            let Some(args) = node.child_by_field_name("arguments") else {
                return true;
            };
            let Some(arg) = args.named_child(0) else {
                return true;
            };
            let (line, _, _) = position(node);
            let path = node_text(arg, source).trim_matches('"').trim_matches('\'').to_string();
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
    fn extracts_method_scoped_to_class() {
        let parser = RubyParser;
        let result = parser.parse("class Greeter\n  def hello\n  end\nend\n");
        let method = result.symbols.iter().find(|s| s.name == "hello").unwrap();
        assert_eq!(method.scope.as_deref(), Some("Greeter"));
    }

    #[test]
    fn extracts_require() {
        let parser = RubyParser;
        let result = parser.parse("require 'json'\n");
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].source_path, "json");
    }
}
