//! TypeScript/TSX extractor.

use tree_sitter::Node;

use crate::domain::code::SymbolKind;
use crate::index::parser::{
    ancestor_of_kind, node_text, position, walk, ExtractedImport, ExtractedSymbol, LanguageParser,
};

pub struct TypeScriptParser;

const SCOPE_KINDS: &[&str] = &["class_declaration", "function_declaration", "interface_declaration"];

fn is_exported(node: Node, source: &str) -> (bool, bool) {
    let Some(parent) = node.parent() else {
        return (false, false);
    };
    if parent.kind() == "export_statement" {
        let text = node_text(parent, source);
        return (true, text.contains("export default"));
    }
    (false, false)
}

fn scope_name(node: Node, source: &str) -> Option<String> {
    let ancestor = ancestor_of_kind(node, SCOPE_KINDS)?;
    let name_node = ancestor.child_by_field_name("name")?;
    Some(node_text(name_node, source).to_string())
}

impl LanguageParser for TypeScriptParser {
    fn language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::language_tsx()
    }

    fn name(&self) -> &'static str {
        "typescript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx"]
    }

    fn extract_symbols(&self, root: Node, source: &str, out: &mut Vec<ExtractedSymbol>) {
        walk(root, |node| {
            let kind = match node.kind() {
                "function_declaration" => Some(SymbolKind::Function),
                "class_declaration" => Some(SymbolKind::Class),
                "interface_declaration" => Some(SymbolKind::Interface),
                "type_alias_declaration" => Some(SymbolKind::Type),
                "enum_declaration" => Some(SymbolKind::Enum),
                "method_definition" => Some(SymbolKind::Method),
                _ => None,
            };
            let Some(kind) = kind else { return true };
            let Some(name_node) = node.child_by_field_name("name") else {
                return true;
            };
            let (line, column, end_line) = position(node);
            let (exported, is_default) = is_exported(node, source);
            let signature = node
                .child_by_field_name("parameters")
                .map(|p| node_text(p, source).to_string());
            out.push(ExtractedSymbol {
                name: node_text(name_node, source).to_string(),
                kind,
                line: line + 1,
                column,
                end_line: Some(end_line + 1),
                exported,
                is_default,
                scope: scope_name(node, source),
                signature,
            });
            true
        });
    }

    fn extract_imports(&self, root: Node, source: &str, out: &mut Vec<ExtractedImport>) {
        walk(root, |node| {
            if node.kind() != "import_statement" {
                return true;
            }
            let (line, _, _) = position(node);
            let Some(source_node) = node.child_by_field_name("source") else {
                return true;
            };
            let source_path = node_text(source_node, source).trim_matches('"').trim_matches('\'').to_string();
            let is_type = node_text(node, source).starts_with("import type");

            let clause = node.named_children(&mut node.walk()).find(|c| c.kind() == "import_clause");
            if let Some(clause) = clause {
                for child in clause.named_children(&mut clause.walk()) {
                    match child.kind() {
                        "identifier" => out.push(ExtractedImport {
                            imported_name: "default".to_string(),
                            local_name: Some(node_text(child, source).to_string()),
                            source_path: source_path.clone(),
                            is_default: true,
                            is_namespace: false,
                            is_type,
                            line: line + 1,
                        }),
                        "namespace_import" => out.push(ExtractedImport {
                            imported_name: "*".to_string(),
                            local_name: Some(node_text(child, source).trim_start_matches("* as ").trim().to_string()),
                            source_path: source_path.clone(),
                            is_default: false,
                            is_namespace: true,
                            is_type,
                            line: line + 1,
                        }),
                        "named_imports" => {
                            for spec in child.named_children(&mut child.walk()) {
                                if spec.kind() != "import_specifier" {
                                    continue;
                                }
                                let name = spec.child_by_field_name("name").map(|n| node_text(n, source).to_string());
                                let alias = spec.child_by_field_name("alias").map(|n| node_text(n, source).to_string());
                                if let Some(name) = name {
                                    out.push(ExtractedImport {
                                        imported_name: name,
                                        local_name: alias,
                                        source_path: source_path.clone(),
                                        is_default: false,
                                        is_namespace: false,
                                        is_type,
                                        line: line + 1,
                                    });
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_exported_function() {
        let parser = TypeScriptParser;
        let result = parser.parse("export function greet(name: string): string { return name; }");
        assert_eq!(result.symbols.len(), 1);
        assert!(result.symbols[0].exported);
        assert!(!result.symbols[0].is_default);
    }

    #[test]
    fn extracts_default_export_class() {
        let parser = TypeScriptParser;
        let result = parser.parse("export default class Widget {}");
        assert_eq!(result.symbols.len(), 1);
        assert!(result.symbols[0].is_default);
    }

    #[test]
    fn extracts_named_imports() {
        let parser = TypeScriptParser;
        let result = parser.parse("import { useState, useEffect as fx } from 'react';");
        assert_eq!(result.imports.len(), 2);
        assert_eq!(result.imports[1].local_name.as_deref(), Some("fx"));
    }
}
