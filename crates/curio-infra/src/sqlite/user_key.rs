//! SQLite-backed [`UserKeyStore`]: per-user API keys encrypted with the vault.
//!
//! Only ciphertext and a masked tail are persisted. Plaintext exists only
//! inside the [`Redacted`] returned by `get_user_api_key`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::Row;

use curio_core::repository::user_key::UserKeyStore;
use curio_types::error::SecretError;
use curio_types::identity::UserId;
use curio_types::secret::{ApiKeyEntry, Redacted};

use super::pool::DatabasePool;
use crate::crypto::vault::VaultCrypto;

pub struct SqliteUserKeyStore {
    pool: DatabasePool,
    vault: Arc<VaultCrypto>,
}

impl SqliteUserKeyStore {
    pub fn new(pool: DatabasePool, vault: Arc<VaultCrypto>) -> Self {
        Self { pool, vault }
    }
}

fn storage_err(e: sqlx::Error) -> SecretError {
    SecretError::StorageError(e.to_string())
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, SecretError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SecretError::StorageError(format!("invalid datetime: {e}")))
}

impl UserKeyStore for SqliteUserKeyStore {
    async fn get_user_api_key(&self, user_id: &UserId) -> Result<Option<Redacted>, SecretError> {
        let row = sqlx::query("SELECT encrypted_key FROM user_api_keys WHERE user_id = ?")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(storage_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let encrypted: Vec<u8> = row.try_get("encrypted_key").map_err(storage_err)?;
        let plaintext = self
            .vault
            .decrypt(&encrypted)
            .map_err(|_| SecretError::EncryptionError)?;
        let key = String::from_utf8(plaintext).map_err(|_| SecretError::EncryptionError)?;
        Ok(Some(Redacted::new(key)))
    }

    async fn set_user_api_key(&self, user_id: &UserId, api_key: &Redacted) -> Result<(), SecretError> {
        let encrypted = self
            .vault
            .encrypt(api_key.expose().as_bytes())
            .map_err(|_| SecretError::EncryptionError)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO user_api_keys (user_id, encrypted_key, masked, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET encrypted_key = excluded.encrypted_key,
                 masked = excluded.masked, updated_at = excluded.updated_at",
        )
        .bind(user_id.as_str())
        .bind(&encrypted)
        .bind(api_key.masked())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(storage_err)?;

        tracing::info!(%user_id, "stored user API key");
        Ok(())
    }

    async fn delete_user_api_key(&self, user_id: &UserId) -> Result<bool, SecretError> {
        let result = sqlx::query("DELETE FROM user_api_keys WHERE user_id = ?")
            .bind(user_id.as_str())
            .execute(&self.pool.writer)
            .await
            .map_err(storage_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_entry(&self, user_id: &UserId) -> Result<Option<ApiKeyEntry>, SecretError> {
        let row = sqlx::query(
            "SELECT masked, created_at, updated_at FROM user_api_keys WHERE user_id = ?",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(storage_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let masked: String = row.try_get("masked").map_err(storage_err)?;
        let created_at: String = row.try_get("created_at").map_err(storage_err)?;
        let updated_at: String = row.try_get("updated_at").map_err(storage_err)?;

        Ok(Some(ApiKeyEntry {
            user_id: user_id.clone(),
            masked,
            created_at: parse_datetime(&created_at)?,
            updated_at: parse_datetime(&updated_at)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn vault(seed: u8) -> Arc<VaultCrypto> {
        Arc::new(VaultCrypto::new(&[seed; 32]))
    }

    #[tokio::test]
    async fn test_set_and_get_roundtrip() {
        let store = SqliteUserKeyStore::new(test_pool().await, vault(7));
        let user = UserId::from("alice");

        store
            .set_user_api_key(&user, &Redacted::new("sk-ant-alice-1234"))
            .await
            .unwrap();
        let key = store.get_user_api_key(&user).await.unwrap().unwrap();
        assert_eq!(key.expose(), "sk-ant-alice-1234");

        assert!(store.get_user_api_key(&UserId::from("bob")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_value_is_encrypted_at_rest() {
        let pool = test_pool().await;
        let store = SqliteUserKeyStore::new(pool.clone(), vault(7));
        store
            .set_user_api_key(&UserId::from("alice"), &Redacted::new("sk-plaintext-value"))
            .await
            .unwrap();

        let (blob,): (Vec<u8>,) =
            sqlx::query_as("SELECT encrypted_key FROM user_api_keys WHERE user_id = 'alice'")
                .fetch_one(&pool.reader)
                .await
                .unwrap();
        assert!(!String::from_utf8_lossy(&blob).contains("sk-plaintext-value"));
    }

    #[tokio::test]
    async fn test_upsert_replaces_key_and_keeps_created_at() {
        let store = SqliteUserKeyStore::new(test_pool().await, vault(7));
        let user = UserId::from("alice");

        store.set_user_api_key(&user, &Redacted::new("sk-first-1111")).await.unwrap();
        let first = store.get_entry(&user).await.unwrap().unwrap();
        store.set_user_api_key(&user, &Redacted::new("sk-second-2222")).await.unwrap();
        let second = store.get_entry(&user).await.unwrap().unwrap();

        assert_eq!(store.get_user_api_key(&user).await.unwrap().unwrap().expose(), "sk-second-2222");
        assert_eq!(second.masked, "****2222");
        assert_eq!(second.created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = SqliteUserKeyStore::new(test_pool().await, vault(7));
        let user = UserId::from("alice");
        store.set_user_api_key(&user, &Redacted::new("sk-x-9999")).await.unwrap();

        assert!(store.delete_user_api_key(&user).await.unwrap());
        assert!(!store.delete_user_api_key(&user).await.unwrap());
        assert!(store.get_entry(&user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wrong_vault_key_is_an_encryption_error() {
        let pool = test_pool().await;
        SqliteUserKeyStore::new(pool.clone(), vault(1))
            .set_user_api_key(&UserId::from("alice"), &Redacted::new("sk-x-9999"))
            .await
            .unwrap();

        let other = SqliteUserKeyStore::new(pool, vault(2));
        let err = other.get_user_api_key(&UserId::from("alice")).await.unwrap_err();
        assert_eq!(err, SecretError::EncryptionError);
    }
}
