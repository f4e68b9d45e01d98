//! Repository trait definitions (ports).
//!
//! These traits define the storage interfaces that the infrastructure layer
//! (curio-infra) implements. The core crate never depends on any specific
//! storage technology.

pub mod cache;
pub mod content;
pub mod counter;
pub mod user_key;
