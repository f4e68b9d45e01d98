//! Text embedding ports and the shared caching wrapper.

pub mod box_embedder;
pub mod caching;
pub mod embedder;
