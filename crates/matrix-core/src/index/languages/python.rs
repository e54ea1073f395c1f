//! Python extractor.

use tree_sitter::Node;

use crate::domain::code::SymbolKind;
use crate::index::parser::{
    ancestor_of_kind, node_text, position, walk, ExtractedImport, ExtractedSymbol, LanguageParser,
};

pub struct PythonParser;

const SCOPE_KINDS: &[&str] = &["function_definition", "class_definition"];

fn is_private(name: &str) -> bool {
    name.starts_with('_')
}

fn scope_name(node: Node, source: &str) -> Option<String> {
    let ancestor = ancestor_of_kind(node, SCOPE_KINDS)?;
    let name_node = ancestor.child_by_field_name("name")?;
    Some(node_text(name_node, source).to_string())
}

impl LanguageParser for PythonParser {
    fn language(&self) -> tree_sitter::Language {
        tree_sitter_python::language()
    }

    fn name(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn extract_symbols(&self, root: Node, source: &str, out: &mut Vec<ExtractedSymbol>) {
        walk(root, |node| {
            let kind = match node.kind() {
                "function_definition" => Some(SymbolKind::Function),
                "class_definition" => Some(SymbolKind::Class),
                _ => None,
            };
            let Some(kind) = kind else { return true };
            let Some(name_node) = node.child_by_field_name("name") else {
                return true;
            };
            let name = node_text(name_node, source).to_string();
            let (line, column, end_line) = position(node);
            let scope = scope_name(node, source);
            let kind = if kind == SymbolKind::Function && scope.is_some() {
                SymbolKind::Method
            } else {
                kind
            };
            let signature = node
                .child_by_field_name("parameters")
                .map(|p| node_text(p, source).to_string());
            out.push(ExtractedSymbol {
                exported: !is_private(&name),
                is_default: false,
                name,
                kind,
                line: line + 1,
                column,
                end_line: Some(end_line + 1),
                scope,
                signature,
            });
            true
        });
    }

    fn extract_imports(&self, root: Node, source: &str, out: &mut Vec<ExtractedImport>) {
        walk(root, |node| {
            let (line, _, _) = position(node);
            match node.kind() {
                "import_statement" => {
                    for child in node.named_children(&mut node.walk()) {
                        let (module, alias) = match child.kind() {
                            "dotted_name" => (node_text(child, source).to_string(), None),
                            "aliased_import" => {
                                let name = child
                                    .child_by_field_name("name")
                                    .map(|n| node_text(n, source).to_string())
                                    .unwrap_or_default();
                                let alias = child
                                    .child_by_field_name("alias")
                                    .map(|n| node_text(n, source).to_string());
                                (name, alias)
                            }
                            _ => continue,
                        };
                        out.push(ExtractedImport {
                            imported_name: module.clone(),
                            local_name: alias,
                            source_path: module,
                            is_default: false,
                            is_namespace: false,
                            is_type: false,
                            line: line + 1,
                        });
                    }
                    false
                }
                "import_from_statement" => {
                    let module = node
                        .child_by_field_name("module_name")
                        .map(|n| node_text(n, source).to_string())
                        .unwrap_or_default();
                    for child in node.named_children(&mut node.walk()) {
                        match child.kind() {
                            "dotted_name" if node_text(child, source) == module => {}
                            "wildcard_import" => out.push(ExtractedImport {
                                imported_name: "*".to_string(),
                                local_name: None,
                                source_path: module.clone(),
                                is_default: false,
                                is_namespace: true,
                                is_type: false,
                                line: line + 1,
                            }),
                            "dotted_name" => out.push(ExtractedImport {
                                imported_name: node_text(child, source).to_string(),
                                local_name: None,
                                source_path: module.clone(),
                                is_default: false,
                                is_namespace: false,
                                is_type: false,
                                line: line + 1,
                            }),
                            "aliased_import" => {
                                let name = child
                                    .child_by_field_name("name")
                                    .map(|n| node_text(n, source).to_string())
                                    .unwrap_or_default();
                                let alias = child
                                    .child_by_field_name("alias")
                                    .map(|n| node_text(n, source).to_string());
                                out.push(ExtractedImport {
                                    imported_name: name,
                                    local_name: alias,
                                    source_path: module.clone(),
                                    is_default: false,
                                    is_namespace: false,
                                    is_type: false,
                                    line: line + 1,
                                });
                            }
                            _ => {}
                        }
                    }
                    false
                }
                _ => true,
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_function_and_private_helper() {
        let parser = PythonParser;
        let result = parser.parse("def greet():\n    pass\n\ndef _helper():\n    pass\n");
        assert_eq!(result.symbols.len(), 2);
        assert!(result.symbols[0].exported);
        assert!(!result.symbols[1].exported);
    }

    #[test]
    fn methods_carry_enclosing_class_as_scope() {
        let parser = PythonParser;
        let result = parser.parse("class Greeter:\n    def hello(self):\n        pass\n");
        let method = result.symbols.iter().find(|s| s.name == "hello").unwrap();
        assert_eq!(method.scope.as_deref(), Some("Greeter"));
        assert_eq!(method.kind, SymbolKind::Method);
    }

    #[test]
    fn extracts_from_import() {
        let parser = PythonParser;
        let result = parser.parse("from os import path as p\n");
        assert_eq!(result.imports.len(), 1);
        assert_eq!(result.imports[0].local_name.as_deref(), Some("p"));
    }
}
