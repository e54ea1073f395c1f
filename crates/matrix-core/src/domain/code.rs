//! Indexer bookkeeping types: [`RepoFile`], [`Symbol`], [`Import`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Indexer bookkeeping row for one scanned file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoFile {
    pub id: i64,
    pub repo_id: String,
    pub file_path: String,
    pub mtime: i64,
    pub hash: Option<String>,
    pub indexed_at: DateTime<Utc>,
}

/// The shape of a source-code definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
    Type,
    Enum,
    Variable,
    Const,
    Method,
    Property,
    Namespace,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Type => "type",
            Self::Enum => "enum",
            Self::Variable => "variable",
            Self::Const => "const",
            Self::Method => "method",
            Self::Property => "property",
            Self::Namespace => "namespace",
        };
        write!(f, "{s}")
    }
}

impl FromStr for SymbolKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "function" => Ok(Self::Function),
            "class" => Ok(Self::Class),
            "interface" => Ok(Self::Interface),
            "type" => Ok(Self::Type),
            "enum" => Ok(Self::Enum),
            "variable" => Ok(Self::Variable),
            "const" => Ok(Self::Const),
            "method" => Ok(Self::Method),
            "property" => Ok(Self::Property),
            "namespace" => Ok(Self::Namespace),
            other => Err(Error::validation(
                "symbol kind",
                format!("unknown kind '{other}'"),
            )),
        }
    }
}

/// A source-code definition owned by exactly one [`RepoFile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub id: i64,
    pub repo_id: String,
    pub file_id: i64,
    pub name: String,
    pub kind: SymbolKind,
    pub line: i64,
    pub column: i64,
    pub end_line: Option<i64>,
    pub exported: bool,
    pub is_default: bool,
    pub scope: Option<String>,
    pub signature: Option<String>,
}

/// An import statement owned by exactly one [`RepoFile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Import {
    pub id: i64,
    pub file_id: i64,
    pub imported_name: String,
    pub local_name: Option<String>,
    pub source_path: String,
    pub is_default: bool,
    pub is_namespace: bool,
    pub is_type: bool,
    pub line: i64,
}
