//! Per-user API key store trait definition.

use curio_types::error::SecretError;
use curio_types::identity::UserId;
use curio_types::secret::{ApiKeyEntry, Redacted};

/// Storage for users' own LLM API keys, encrypted at rest.
///
/// Values are decrypted only when read and returned wrapped in [`Redacted`].
pub trait UserKeyStore: Send + Sync {
    /// The user's decrypted key, or `None` if they have not configured one.
    fn get_user_api_key(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<Redacted>, SecretError>> + Send;

    /// Store (or replace) the user's key.
    fn set_user_api_key(
        &self,
        user_id: &UserId,
        api_key: &Redacted,
    ) -> impl std::future::Future<Output = Result<(), SecretError>> + Send;

    /// Remove the user's key. Returns whether one existed.
    fn delete_user_api_key(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<bool, SecretError>> + Send;

    /// Metadata about the stored key (never the value).
    fn get_entry(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<ApiKeyEntry>, SecretError>> + Send;
}
