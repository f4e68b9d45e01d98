//! LLM access for the intent analyzer.
//!
//! Providers are pluggable through [`provider::LlmProvider`]; the
//! [`gateway::LlmGateway`] wraps every outbound call with key resolution,
//! quota reservation, a per-user client pool, a timeout and a circuit breaker.

pub mod box_provider;
pub mod breaker;
pub mod client_pool;
pub mod factory;
pub mod gateway;
pub mod provider;
