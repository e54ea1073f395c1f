//! Opaque id generation: a short entity prefix plus 8 hex characters taken
//! from a v4 UUID (e.g. `sol_3f9a21bc`).

use uuid::Uuid;

/// Generate an id of the form `{prefix}_{8 hex chars}`.
#[must_use]
pub fn generate(prefix: &str) -> String {
    let uuid = Uuid::new_v4();
    let hex = uuid.simple().to_string();
    format!("{prefix}_{}", &hex[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_the_requested_prefix() {
        let id = generate("sol");
        assert!(id.starts_with("sol_"));
        assert_eq!(id.len(), "sol_".len() + 8);
    }

    #[test]
    fn ids_are_unique_across_calls() {
        let a = generate("task");
        let b = generate("task");
        assert_ne!(a, b);
    }
}
