//! Anthropic Claude provider for the Messages API.

pub mod client;
pub mod types;

pub use client::AnthropicProvider;
