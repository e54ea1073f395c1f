//! Go extractor.

use tree_sitter::Node;

use crate::domain::code::SymbolKind;
use crate::index::parser::{node_text, position, walk, ExtractedImport, ExtractedSymbol, LanguageParser};

pub struct GoParser;

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

impl LanguageParser for GoParser {
    fn language(&self) -> tree_sitter::Language {
        tree_sitter_go::language()
    }

    fn name(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn extract_symbols(&self, root: Node, source: &str, out: &mut Vec<ExtractedSymbol>) {
        walk(root, |node| {
            match node.kind() {
                "function_declaration" => {
                    if let Some(name_node) = node.child_by_field_name("name") {
                        push_func(node, name_node, source, None, out);
                    }
                }
                "method_declaration" => {
                    if let Some(name_node) = node.child_by_field_name("name") {
                        let receiver = node
                            .child_by_field_name("receiver")
                            .map(|r| node_text(r, source).to_string());
                        push_func(node, name_node, source, receiver, out);
                    }
                }
                "type_declaration" => {
                    for spec in node.named_children(&mut node.walk()) {
                        if spec.kind() != "type_spec" {
                            continue;
                        }
                        let Some(name_node) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let underlying = spec.child_by_field_name("type");
                        let kind = match underlying.map(|n| n.kind()) {
                            Some("struct_type") => SymbolKind::Class,
                            Some("interface_type") => SymbolKind::Interface,
                            _ => SymbolKind::Type,
                        };
                        let name = node_text(name_node, source).to_string();
                        let (line, column, end_line) = position(spec);
                        out.push(ExtractedSymbol {
                            exported: is_exported(&name),
                            is_default: false,
                            name,
                            kind,
                            line: line + 1,
                            column,
                            end_line: Some(end_line + 1),
                            scope: None,
                            signature: None,
                        });
                    }
                }
                "const_declaration" | "var_declaration" => {
                    for spec in node.named_children(&mut node.walk()) {
                        for ident in spec.named_children(&mut spec.walk()) {
                            if ident.kind() != "identifier" {
                                continue;
                            }
                            let name = node_text(ident, source).to_string();
                            let (line, column, end_line) = position(ident);
                            out.push(ExtractedSymbol {
                                exported: is_exported(&name),
                                is_default: false,
                                name,
                                kind: SymbolKind::Const,
                                line: line + 1,
                                column,
                                end_line: Some(end_line + 1),
                                scope: None,
                                signature: None,
                            });
                        }
                    }
                }
                _ => {}
            }
            true
        });
    }

    fn extract_imports(&self, root: Node, source: &str, out: &mut Vec<ExtractedImport>) {
        walk(root, |node| {
            if node.kind() != "import_spec" {
                return true;
            }
            let (line, _, _) = position(node);
            let path_node = node.child_by_field_name("path");
            let Some(path_node) = path_node else { return true };
            let path = node_text(path_node, source).trim_matches('"').to_string();
            let alias = node.child_by_field_name("name").map(|n| node_text(n, source).to_string());
            let is_namespace = alias.as_deref() == Some(".");
            out.push(ExtractedImport {
                imported_name: path.clone(),
                local_name: alias,
                source_path: path,
                is_default: false,
                is_namespace,
                is_type: false,
                line: line + 1,
            });
            true
        });
    }
}

fn push_func(
    node: Node,
    name_node: Node,
    source: &str,
    scope: Option<String>,
    out: &mut Vec<ExtractedSymbol>,
) {
    let name = node_text(name_node, source).to_string();
    let (line, column, end_line) = position(node);
    let signature = node
        .child_by_field_name("parameters")
        .map(|p| node_text(p, source).to_string());
    out.push(ExtractedSymbol {
        exported: is_exported(&name),
        is_default: false,
        name,
        kind: if scope.is_some() { SymbolKind::Method } else { SymbolKind::Function },
        line: line + 1,
        column,
        end_line: Some(end_line + 1),
        scope,
        signature,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exported_function_is_capitalized() {
        let parser = GoParser;
        let result = parser.parse("package main\n\nfunc Greet() string { return \"hi\" }\nfunc helper() {}\n");
        assert_eq!(result.symbols.len(), 2);
        assert!(result.symbols[0].exported);
        assert!(!result.symbols[1].exported);
    }

    #[test]
    fn extracts_import_spec() {
        let parser = GoParser;
        let result = parser.parse("package main\n\nimport \"fmt\"\n");
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].source_path, "fmt");
    }
}
