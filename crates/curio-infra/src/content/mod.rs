//! Content repository adapters.
//!
//! - [`memory`]: in-process repository, loadable from a JSON snapshot

pub mod memory;

pub use memory::{ContentSnapshot, InMemoryContentRepository};
