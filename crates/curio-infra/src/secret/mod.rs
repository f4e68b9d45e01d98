//! Secret sources outside the encrypted key store.
//!
//! - [`env`]: the shared fallback API key, read from the environment

pub mod env;

pub use env::shared_key_from_env;
