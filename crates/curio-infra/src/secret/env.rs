//! Environment-variable source for the shared fallback API key.
//!
//! The variable name comes from `llm.shared_key_env` in the config. The
//! shared key is read once at startup; users' own keys live in the
//! encrypted SQLite store instead.

use curio_types::secret::Redacted;

/// Read the shared fallback key from `var`.
///
/// Missing, blank or non-Unicode values yield `None`, which disables the
/// fallback: users without their own key then get heuristic intent analysis.
pub fn shared_key_from_env(var: &str) -> Option<Redacted> {
    shared_key_from(var, |name| std::env::var(name).ok())
}

/// Same as [`shared_key_from_env`] with an injectable lookup.
pub fn shared_key_from(var: &str, lookup: impl Fn(&str) -> Option<String>) -> Option<Redacted> {
    let value = lookup(var)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        tracing::warn!(var, "shared API key variable is set but blank, ignoring");
        return None;
    }
    tracing::debug!(var, "shared API key loaded from environment");
    Some(Redacted::new(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_value_is_trimmed() {
        let key = shared_key_from("CURIO_SHARED_API_KEY", |_| Some("  sk-shared-1234\n".into()));
        assert_eq!(key.unwrap().expose(), "sk-shared-1234");
    }

    #[test]
    fn test_missing_or_blank_is_none() {
        assert!(shared_key_from("X", |_| None).is_none());
        assert!(shared_key_from("X", |_| Some("   ".into())).is_none());
    }

    #[test]
    fn test_lookup_uses_configured_name() {
        let key = shared_key_from("MY_KEY_VAR", |name| {
            (name == "MY_KEY_VAR").then(|| "sk-named".to_string())
        });
        assert!(key.is_some());
    }

    #[test]
    fn test_unset_process_variable_is_none() {
        assert!(shared_key_from_env("CURIO_TEST_VARIABLE_THAT_IS_NEVER_SET_7f3a").is_none());
    }
}
