//! Static dependency-name -> framework map, and repo-pattern detection.

use std::path::Path;

/// Dependency names recognized as a framework, paired with the framework's
/// display name. Checked in order; a dependency list can surface more than
/// one match.
const FRAMEWORK_MAP: &[(&str, &str)] = &[
    ("express", "express"),
    ("fastify", "fastify"),
    ("koa", "koa"),
    ("next", "next.js"),
    ("nuxt", "nuxt"),
    ("react", "react"),
    ("vue", "vue"),
    ("svelte", "svelte"),
    ("@angular/core", "angular"),
    ("django", "django"),
    ("flask", "flask"),
    ("fastapi", "fastapi"),
    ("axum", "axum"),
    ("actix-web", "actix-web"),
    ("tokio", "tokio"),
    ("rocket", "rocket"),
    ("gin-gonic/gin", "gin"),
    ("labstack/echo", "echo"),
    ("spring-boot", "spring-boot"),
];

/// Derive the set of recognized frameworks from a flat dependency list.
#[must_use]
pub fn detect_frameworks(dependencies: &[String]) -> Vec<String> {
    let mut found: Vec<String> = FRAMEWORK_MAP
        .iter()
        .filter(|(dep_name, _)| dependencies.iter().any(|d| d.contains(dep_name)))
        .map(|(_, framework)| (*framework).to_string())
        .collect();
    found.sort();
    found.dedup();
    found
}

/// Structural patterns detected by the presence of well-known files, not by
/// dependency name.
#[must_use]
pub fn detect_patterns(dir: &Path, is_workspace: bool, dependencies: &[String]) -> Vec<String> {
    let mut patterns = Vec::new();

    if is_workspace
        || dir.join("pnpm-workspace.yaml").exists()
        || dir.join("lerna.json").exists()
        || dir.join("turbo.json").exists()
    {
        patterns.push("monorepo".to_string());
    }

    if dependencies.iter().any(|d| {
        ["express", "fastify", "koa", "axum", "actix-web", "rocket", "flask", "fastapi", "gin-gonic/gin"]
            .iter()
            .any(|name| d.contains(name))
    }) {
        patterns.push("api-framework".to_string());
    }

    if dependencies
        .iter()
        .any(|d| ["clap", "commander", "yargs", "click", "cobra"].iter().any(|name| d.contains(name)))
    {
        patterns.push("cli-library".to_string());
    }

    if dir.join("Cargo.toml").exists() && dir.join("src/lib.rs").exists()
        || dir.join("setup.py").exists()
        || dir.join("pyproject.toml").exists() && !dir.join("manage.py").exists()
    {
        patterns.push("library-build".to_string());
    }

    patterns.sort();
    patterns.dedup();
    patterns
}
