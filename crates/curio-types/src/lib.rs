//! Shared domain types for curio.
//!
//! This crate contains the value objects passed between the recommender's
//! layers: requests, candidates, intents, interaction history, ranked recommendations, quota
//! state, configuration, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod candidate;
pub mod config;
pub mod error;
pub mod identity;
pub mod intent;
pub mod interaction;
pub mod llm;
pub mod quota;
pub mod recommendation;
pub mod request;
pub mod secret;
