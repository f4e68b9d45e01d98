//! Atomic counter store trait definition (backs the quota manager).

use std::time::Duration;

use curio_types::error::QuotaError;

/// Counters with atomic increment-and-get semantics.
///
/// Implementations must make `incr_with_expiry` a single atomic step: two
/// concurrent callers never observe the same post-increment value. This is
/// the primitive that keeps quota reservation race-free, whether the store
/// is in-process or shared between workers.
pub trait CounterStore: Send + Sync {
    /// Increment `key` by one and return the new value.
    ///
    /// A missing (or expired) key starts from zero and expires after `ttl`.
    fn incr_with_expiry(
        &self,
        key: &str,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<u64, QuotaError>> + Send;

    /// Decrement `key` by one, saturating at zero. Returns the new value.
    fn decr(&self, key: &str) -> impl std::future::Future<Output = Result<u64, QuotaError>> + Send;

    /// Current value (zero when missing or expired).
    fn get(&self, key: &str) -> impl std::future::Future<Output = Result<u64, QuotaError>> + Send;
}
