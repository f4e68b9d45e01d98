//! Cryptographic operations for curio.
//!
//! - [`vault`]: AES-256-GCM encryption for user API keys at rest

pub mod vault;
