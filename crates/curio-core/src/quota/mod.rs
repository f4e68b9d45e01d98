//! Per-user quota enforcement for outbound LLM calls.

pub mod clock;
pub mod manager;
pub mod window;
