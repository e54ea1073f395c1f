//! C++ extractor.

use tree_sitter::Node;

use crate::domain::code::SymbolKind;
use crate::index::parser::{
    ancestor_of_kind, node_text, position, walk, ExtractedImport, ExtractedSymbol, LanguageParser,
};

pub struct CppParser;

const SCOPE_KINDS: &[&str] = &["class_specifier", "struct_specifier", "namespace_definition"];

fn scope_name(node: Node, source: &str) -> Option<String> {
    let ancestor = ancestor_of_kind(node, SCOPE_KINDS)?;
    let name_node = ancestor.child_by_field_name("name")?;
    Some(node_text(name_node, source).to_string())
}

fn find_identifier(node: Node) -> Option<Node> {
    if node.kind() == "identifier" || node.kind() == "field_identifier" {
        return Some(node);
    }
    let declarator = node.child_by_field_name("declarator")?;
    find_identifier(declarator)
}

impl LanguageParser for CppParser {
    fn language(&self) -> tree_sitter::Language {
        tree_sitter_cpp::language()
    }

    fn name(&self) -> &'static str {
        "cpp"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["cpp", "cc", "cxx", "hpp", "hh"]
    }

    fn extract_symbols(&self, root: Node, source: &str, out: &mut Vec<ExtractedSymbol>) {
        walk(root, |node| {
            match node.kind() {
                "function_definition" => {
                    if let Some(declarator) = node.child_by_field_name("declarator") {
                        if let Some(name_node) = find_identifier(declarator) {
                            let scope = scope_name(node, source);
                            let (line, column, end_line) = position(node);
                            out.push(ExtractedSymbol {
                                name: node_text(name_node, source).to_string(),
                                kind: if scope.is_some() { SymbolKind::Method } else { SymbolKind::Function },
                                line: line + 1,
                                column,
                                end_line: Some(end_line + 1),
                                exported: true,
                                is_default: false,
                                scope,
                                signature: None,
                            });
                        }
                    }
                }
                "class_specifier" | "struct_specifier" => {
                    if let Some(name_node) = node.child_by_field_name("name") {
                        let (line, column, end_line) = position(node);
                        out.push(ExtractedSymbol {
                            name: node_text(name_node, source).to_string(),
                            kind: SymbolKind::Class,
                            line: line + 1,
                            column,
                            end_line: Some(end_line + 1),
                            exported: true,
                            is_default: false,
                            scope: None,
                            signature: None,
                        });
                    }
                }
                _ => {}
            }
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
