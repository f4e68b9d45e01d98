//! Result cache store trait definition.

use std::time::Duration;

use curio_types::error::CacheError;

/// Key/value store with per-entry TTL and glob invalidation.
///
/// Values are opaque strings (serialized by the caller).
pub trait CacheStore: Send + Sync {
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, CacheError>> + Send;

    fn set(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), CacheError>> + Send;

    /// Remove every key matching `pattern` (see [`pattern_matches`]).
    /// Returns the number of removed entries.
    fn invalidate_pattern(
        &self,
        pattern: &str,
    ) -> impl std::future::Future<Output = Result<u64, CacheError>> + Send;
}

/// Glob match where `*` matches any run of characters (including none).
///
/// No other metacharacters are recognized.
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return key.is_empty();
    };
    let Some(mut rest) = key.strip_prefix(first) else {
        return false;
    };

    let remaining: Vec<&str> = parts.collect();
    let Some((last, middle)) = remaining.split_last() else {
        // No '*' at all: exact match.
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}
