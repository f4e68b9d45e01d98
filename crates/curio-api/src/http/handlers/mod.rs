//! REST endpoint handlers.

pub mod recommendation;
pub mod user;
