//! Project descriptor parsing: one function per ecosystem manifest.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

/// What one manifest file told us about a project.
#[derive(Debug, Clone, Default)]
pub struct ManifestInfo {
    pub language: &'static str,
    pub name: Option<String>,
    pub dependencies: Vec<String>,
    pub test_framework: Option<String>,
    /// True if this manifest declares a workspace/monorepo layout.
    pub is_workspace: bool,
}

#[derive(Debug, Deserialize, Default)]
struct PackageJson {
    name: Option<String>,
    #[serde(default)]
    dependencies: std::collections::BTreeMap<String, Value>,
    #[serde(default)]
    dev_dependencies: std::collections::BTreeMap<String, Value>,
    #[serde(default)]
    workspaces: Option<Value>,
}

/// Read and parse `package.json` at `dir`, if present.
#[must_use]
pub fn read_package_json(dir: &Path) -> Option<ManifestInfo> {
    let content = std::fs::read_to_string(dir.join("package.json")).ok()?;
    let parsed: PackageJson = serde_json::from_str(&content).ok()?;

    let mut dependencies: Vec<String> = parsed.dependencies.keys().cloned().collect();
    dependencies.extend(parsed.dev_dependencies.keys().cloned());
    dependencies.sort();
    dependencies.dedup();

    let test_framework = ["jest", "vitest", "mocha", "ava", "tap"]
        .iter()
        .find(|name| dependencies.iter().any(|d| d == *name))
        .map(|s| (*s).to_string());

    Some(ManifestInfo {
        language: "javascript",
        name: parsed.name,
        dependencies,
        test_framework,
        is_workspace: parsed.workspaces.is_some(),
    })
}

#[derive(Debug, Deserialize, Default)]
struct CargoToml {
    package: Option<CargoPackage>,
    dependencies: Option<std::collections::BTreeMap<String, Value>>,
    #[serde(rename = "dev-dependencies")]
    dev_dependencies: Option<std::collections::BTreeMap<String, Value>>,
    workspace: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
struct CargoPackage {
    name: Option<String>,
}

/// Read and parse `Cargo.toml` at `dir`, if present.
#[must_use]
pub fn read_cargo_toml(dir: &Path) -> Option<ManifestInfo> {
    let content = std::fs::read_to_string(dir.join("Cargo.toml")).ok()?;
    let parsed: CargoToml = toml::from_str(&content).ok()?;

    let mut dependencies: Vec<String> = parsed
        .dependencies
        .unwrap_or_default()
        .keys()
        .cloned()
        .collect();
    dependencies.extend(parsed.dev_dependencies.unwrap_or_default().keys().cloned());
    dependencies.sort();
    dependencies.dedup();

    Some(ManifestInfo {
        language: "rust",
        name: parsed.package.and_then(|p| p.name),
        dependencies,
        test_framework: None,
        is_workspace: parsed.workspace.is_some(),
    })
}

#[derive(Debug, Deserialize, Default)]
struct PyProject {
    project: Option<PyProjectTable>,
}

#[derive(Debug, Deserialize, Default)]
struct PyProjectTable {
    name: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
}

/// Read `pyproject.toml`, falling back to `requirements.txt`, at `dir`.
#[must_use]
pub fn read_python_project(dir: &Path) -> Option<ManifestInfo> {
    if let Ok(content) = std::fs::read_to_string(dir.join("pyproject.toml")) {
        let parsed: PyProject = toml::from_str(&content).ok()?;
        let table = parsed.project.unwrap_or_default();
        let dependencies: Vec<String> = table
            .dependencies
            .iter()
            .filter_map(|spec| dependency_name(spec))
            .collect();
        let test_framework = ["pytest", "unittest2", "nose"]
            .iter()
            .find(|name| dependencies.iter().any(|d| d == *name))
            .map(|s| (*s).to_string());
        return Some(ManifestInfo {
            language: "python",
            name: table.name,
            dependencies,
            test_framework,
            is_workspace: false,
        });
    }

    let content = std::fs::read_to_string(dir.join("requirements.txt")).ok()?;
    let dependencies: Vec<String> = content
        .lines()
        .filter_map(|line| dependency_name(line.trim()))
        .collect();
    let test_framework = dependencies
        .iter()
        .find(|d| *d == "pytest")
        .map(|s| s.clone());
    Some(ManifestInfo {
        language: "python",
        name: None,
        dependencies,
        test_framework,
        is_workspace: false,
    })
}

/// Strip a PEP 508-style version/extras specifier down to the bare package name.
fn dependency_name(spec: &str) -> Option<String> {
    let spec = spec.trim();
    if spec.is_empty() || spec.starts_with('#') {
        return None;
    }
    let name: String = spec
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '-' || *c == '_' || *c == '.')
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Read and parse `go.mod` at `dir`, if present.
#[must_use]
pub fn read_go_mod(dir: &Path) -> Option<ManifestInfo> {
    let content = std::fs::read_to_string(dir.join("go.mod")).ok()?;

    let name = content
        .lines()
        .find_map(|line| line.strip_prefix("module "))
        .map(|rest| rest.trim().to_string());

    let mut dependencies = Vec::new();
    let mut in_require_block = false;
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with("require (") {
            in_require_block = true;
            continue;
        }
        if in_require_block && line == ")" {
            in_require_block = false;
            continue;
        }
        let dep_line = if in_require_block {
            Some(line)
        } else {
            line.strip_prefix("require ")
        };
        if let Some(dep_line) = dep_line {
            if let Some(module) = dep_line.split_whitespace().next() {
                dependencies.push(module.to_string());
            }
        }
    }
    dependencies.sort();
    dependencies.dedup();

    Some(ManifestInfo {
        language: "go",
        name,
        dependencies,
        test_framework: None,
        is_workspace: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_package_json_dependencies_and_test_framework() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"name":"demo","dependencies":{"express":"^4.0.0"},"devDependencies":{"jest":"^29.0.0"}}"#,
        )
        .unwrap();
        let info = read_package_json(dir.path()).unwrap();
        assert_eq!(info.name.as_deref(), Some("demo"));
        assert!(info.dependencies.contains(&"express".to_string()));
        assert_eq!(info.test_framework.as_deref(), Some("jest"));
    }

    #[test]
    fn reads_cargo_toml_workspace_flag() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Cargo.toml"),
            "[workspace]\nmembers = [\"a\"]\n",
        )
        .unwrap();
        let info = read_cargo_toml(dir.path()).unwrap();
        assert!(info.is_workspace);
    }

    #[test]
    fn reads_go_mod_module_and_requires() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("go.mod"),
            "module example.com/demo\n\ngo 1.22\n\nrequire (\n\tgithub.com/gin-gonic/gin v1.9.0\n)\n",
        )
        .unwrap();
        let info = read_go_mod(dir.path()).unwrap();
        assert_eq!(info.name.as_deref(), Some("example.com/demo"));
        assert!(info.dependencies.contains(&"github.com/gin-gonic/gin".to_string()));
    }

    #[test]
    fn reads_requirements_txt_when_pyproject_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("requirements.txt"), "pytest==7.0\nrequests>=2\n").unwrap();
        let info = read_python_project(dir.path()).unwrap();
        assert!(info.dependencies.contains(&"pytest".to_string()));
        assert_eq!(info.test_framework.as_deref(), Some("pytest"));
    }

    #[test]
    fn missing_manifest_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_package_json(dir.path()).is_none());
        assert!(read_cargo_toml(dir.path()).is_none());
        assert!(read_python_project(dir.path()).is_none());
        assert!(read_go_mod(dir.path()).is_none());
    }
}
