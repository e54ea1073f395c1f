//! `LANGUAGE_REGISTRY`: every supported language, one file each, wired to
//! its file extensions (§4.9).

mod c;
mod cpp;
mod csharp;
mod elixir;
mod go;
mod java;
mod javascript;
mod kotlin;
mod php;
mod python;
mod ruby;
mod rust;
mod swift;
mod typescript;
mod zig;

use crate::index::parser::LanguageParser;

/// One extension -> parser mapping. Adding a language is additive: a new
/// file plus one new entry here.
pub fn registry() -> Vec<Box<dyn LanguageParser>> {
    vec![
        Box::new(typescript::TypeScriptParser),
        Box::new(javascript::JavaScriptParser),
        Box::new(python::PythonParser),
        Box::new(go::GoParser),
        Box::new(rust::RustParser),
        Box::new(java::JavaParser),
        Box::new(csharp::CSharpParser),
        Box::new(kotlin::KotlinParser),
        Box::new(swift::SwiftParser),
        Box::new(ruby::RubyParser),
        Box::new(php::PhpParser),
        Box::new(c::CParser),
        Box::new(cpp::CppParser),
        Box::new(elixir::ElixirParser),
        Box::new(zig::ZigParser),
    ]
}

/// Find the parser registered for `extension` (case-insensitive, no dot).
pub fn parser_for(extension: &str) -> Option<Box<dyn LanguageParser>> {
    registry()
        .into_iter()
        .find(|p| p.extensions().iter().any(|e| e.eq_ignore_ascii_case(extension)))
}

/// Every extension covered by the registry, for the glob-scan step.
pub fn all_extensions() -> Vec<&'static str> {
    registry().iter().flat_map(|p| p.extensions().iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_by_extension() {
        assert!(parser_for("rs").is_some());
        assert!(parser_for("tsx").is_some());
        assert!(parser_for("unknown_ext").is_none());
    }

    #[test]
    fn registry_has_fifteen_languages() {
        assert_eq!(registry().len(), 15);
    }
}
