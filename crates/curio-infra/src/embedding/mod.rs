//! Local text embeddings.
//!
//! - [`fastembed`]: BGE-small (384 dimensions) on the ONNX runtime

pub mod fastembed;

pub use self::fastembed::FastEmbedder;
