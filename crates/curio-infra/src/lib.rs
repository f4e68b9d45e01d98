//! Infrastructure layer for curio.
//!
//! Contains implementations of the port traits defined in `curio-core`:
//! SQLite key storage, AES-256-GCM vault encryption, in-process cache and
//! counter stores, HTTP LLM clients, local embeddings and the content
//! repository adapter, plus the config file loader.

pub mod config;
pub mod content;
pub mod crypto;
pub mod embedding;
pub mod llm;
pub mod memory;
pub mod secret;
pub mod sqlite;
