//! In-process stores backed by `dashmap`.
//!
//! Used when the API runs as a single process. Expiry is lazy: an entry past
//! its deadline is treated as absent and dropped the next time it is touched.

pub mod cache;
pub mod counter;

pub use cache::MemoryCacheStore;
pub use counter::MemoryCounterStore;
