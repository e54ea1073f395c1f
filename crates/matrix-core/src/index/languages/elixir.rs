//! Elixir extractor. `defmodule`/`def`/`defp` are all `call` nodes with an
//! atom-like target, not dedicated grammar constructs.

use tree_sitter::Node;

use crate::domain::code::SymbolKind;
use crate::index::parser::{
    ancestor_of_kind, node_text, position, walk, ExtractedImport, ExtractedSymbol, LanguageParser,
};

pub struct ElixirParser;

fn call_target(node: Node, source: &str) -> Option<&'static str> {
    let target = node.child_by_field_name("target")?;
    match node_text(target, source) {
        "defmodule" => Some("defmodule"),
        "def" => Some("def"),
        "defp" => Some("defp"),
        "alias" => Some("alias"),
        "import" => Some("import"),
        _ => None,
    }
}

fn first_arg_name(node: Node, source: &str) -> Option<String> {
    let args = node.child_by_field_name("arguments")?;
    let first = args.named_child(0)?;
    Some(node_text(first, source).split(['(', ' ']).next().unwrap_or_default().to_string())
}

impl LanguageParser for ElixirParser {
    fn language(&self) -> tree_sitter::Language {
        tree_sitter_elixir::language()
    }

    fn name(&self) -> &'static str {
        "elixir"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ex", "exs"]
    }

    fn extract_symbols(&self, root: Node, source: &str, out: &mut Vec<ExtractedSymbol>) {
        walk(root, |node| {
            if node.kind() != "call" {
                return true;
            }
            let Some(target) = call_target(node, source) else {
                return true;
            };
            let kind = match target {
                "defmodule" => SymbolKind::Namespace,
                "def" | "defp" => SymbolKind::Function,
                _ => return true,
            };
            let Some(name) = first_arg_name(node, source) else {
                return true;
            };
            let scope = ancestor_of_kind(node, &["call"])
                .filter(|a| call_target(*a, source) == Some("defmodule"))
                .and_then(|a| first_arg_name(a, source));
            let (line, column, end_line) = position(node);
            out.push(ExtractedSymbol {
                exported: target != "defp",
                is_default: false,
                name,
                kind,
                line: line + 1,
                column,
                end_line: Some(end_line + 1),
                scope,
                signature: None,
            });
            true
        });
    }

    fn extract_imports(&self, root: Node, source: &str, out: &mut Vec<ExtractedImport>) {
        walk(root, |node| {
            if node.kind() != "call" {
                return true;
            }
            let Some(target) = call_target(node, source) else {
                return true;
            };
            if target != "alias" && target != "import" {
                return true;
            }
            let Some(name) = first_arg_name(node, source) else {
                return true;
            };
            let (line, _, _) = position(node);
            out.push(ExtractedImport {
                imported_name: name.clone(),
                local_name: None,
                source_path: name,
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
    fn extracts_module_and_functions() {
        let parser = ElixirParser;
        let result = parser.parse(
            "defmodule Greeter do\n  def hello do\n    :ok\n  end\n\n  defp secret do\n    :ok\n  end\nend\n",
        );
        let hello = result.symbols.iter().find(|s| s.name == "hello").unwrap();
        assert!(hello.exported);
        assert_eq!(hello.scope.as_deref(), Some("Greeter"));
        let secret = result.symbols.iter().find(|s| s.name == "secret").unwrap();
        assert!(!secret.exported);
    }
}
