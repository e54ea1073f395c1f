//! Exit code policy (§6): 0 success, 1 user error, 2 invariant violation.

use std::fmt;

/// Raised by commands that detect a state the process should treat as an
/// invariant violation (exit 2) rather than a user mistake (exit 1) — e.g.
/// `doctor` finding an unhealthy store.
#[derive(Debug)]
pub struct InvariantViolation(pub String);

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for InvariantViolation {}

/// Map a top-level command error to a process exit code.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<InvariantViolation>().is_some() {
        return 2;
    }
    if let Some(err) = err.downcast_ref::<matrix_core::Error>() {
        return match err {
            matrix_core::Error::Validation(_) | matrix_core::Error::NotFound(_) => 1,
            matrix_core::Error::SchemaMismatch(_)
            | matrix_core::Error::Timeout(_)
            | matrix_core::Error::Transient(_)
            | matrix_core::Error::Fatal(_) => 2,
        };
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_exit_one() {
        let err = anyhow::Error::new(matrix_core::Error::Validation("bad".to_string()));
        assert_eq!(exit_code_for(&err), 1);
    }

    #[test]
    fn fatal_errors_exit_two() {
        let err = anyhow::Error::new(matrix_core::Error::Fatal("bad".to_string()));
        assert_eq!(exit_code_for(&err), 2);
    }

    #[test]
    fn invariant_violation_exits_two() {
        let err = anyhow::Error::new(InvariantViolation("unhealthy".to_string()));
        assert_eq!(exit_code_for(&err), 2);
    }
}
