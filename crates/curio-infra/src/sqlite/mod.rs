//! SQLite storage layer.
//!
//! Encrypted user API keys, backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod pool;
pub mod user_key;
