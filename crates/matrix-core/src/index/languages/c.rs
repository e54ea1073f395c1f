//! C extractor.

use tree_sitter::Node;

use crate::domain::code::SymbolKind;
use crate::index::parser::{node_text, position, walk, ExtractedImport, ExtractedSymbol, LanguageParser};

pub struct CParser;

impl LanguageParser for CParser {
    fn language(&self) -> tree_sitter::Language {
        tree_sitter_c::language()
    }

    fn name(&self) -> &'static str {
        "c"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["c", "h"]
    }

    fn extract_symbols(&self, root: Node, source: &str, out: &mut Vec<ExtractedSymbol>) {
        walk(root, |node| {
            if node.kind() != "function_definition" {
                return true;
            }
            let Some(declarator) = node.child_by_field_name("declarator") else {
                return true;
            };
            let Some(name_node) = find_identifier(declarator) else {
                return true;
            };
            let (line, column, end_line) = position(node);
            out.push(ExtractedSymbol {
                name: node_text(name_node, source).to_string(),
                kind: SymbolKind::Function,
                line: line + 1,
                column,
                end_line: Some(end_line + 1),
                exported: true,
                is_default: false,
                scope: None,
                signature: None,
            });
            true
        });
    }

    fn extract_imports(&self, root: Node, source: &str, out: &mut Vec<ExtractedImport>) {
        walk(root, |node| {
            if node.kind() != "preproc_include" {
                return true;
            }
            let (line, _, _) = position(node);
            let Some(path_node) = node.named_child(0) else {
                return true;
            };
            let raw = node_text(path_node, source);
            let path = raw.trim_matches('"').trim_start_matches('<').trim_end_matches('>').to_string();
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

/// A `function_declarator`'s identifier may be nested under pointer
/// declarators (`int *foo(...)`); walk down to find the name.
fn find_identifier(node: Node) -> Option<Node> {
    if node.kind() == "identifier" {
        return Some(node);
    }
    let declarator = node.child_by_field_name("declarator")?;
    find_identifier(declarator)
}
