//! Error types shared by every subsystem in `matrix-core`.
//!
//! One enum variant per error kind in the specification's error-handling
//! design: `ValidationError`, `NotFound`, `SchemaMismatch`, `Timeout`,
//! `Transient`, and `Fatal`. Callers match on [`Error`] directly rather than
//! parsing messages; the `String` payload is for humans, not control flow.

use std::fmt;

/// Result alias used throughout `matrix-core`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the store, memory engine, indexer, and scheduler.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input violated the declared schema for an operation. Never recoverable
    /// at the call site that raised it; surfaced with the offending field.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity (solution id, task id, repo id, ...) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A vector's length didn't match `D`, or a stored enum value was out of
    /// range. Per-row occurrences during a scan are skipped by the caller;
    /// this variant is only raised when there is no row to skip, e.g. at
    /// `cosine`.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A deadline fired: a scheduler timeout, or an HTTP call past its
    /// budget.
    #[error("timeout: {0}")]
    Timeout(String),

    /// An external dependency (HTTP API, grammar download) failed in a way
    /// that the caller is expected to treat as "no result" rather than retry.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The store could not be opened or migrated. Always fatal to the
    /// current process.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl Error {
    /// Build a [`Error::Validation`] with a field path prefix.
    pub fn validation(field: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::Validation(format!("{field}: {reason}"))
    }

    /// Build a [`Error::NotFound`] naming the entity and id.
    pub fn not_found(entity: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{entity} '{id}'"))
    }

    /// True if this error represents a dimension/shape mismatch specifically
    /// (as opposed to any other schema mismatch).
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, Self::SchemaMismatch(msg) if msg.contains("dimension"))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("row not found".to_string()),
            other => Self::Fatal(format!("store error: {other}")),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Fatal(format!("migration error: {err}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Fatal(format!("io error: {err}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("json error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_detection() {
        let err = Error::SchemaMismatch("dimension mismatch: 3 != 4".to_string());
        assert!(err.is_dimension_mismatch());
        let err = Error::SchemaMismatch("enum out of range".to_string());
        assert!(!err.is_dimension_mismatch());
    }

    #[test]
    fn not_found_formats_entity_and_id() {
        let err = Error::not_found("solution", "sol_abc123");
        assert_eq!(err.to_string(), "not found: solution 'sol_abc123'");
    }
}
