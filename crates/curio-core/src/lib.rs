//! Recommendation orchestration and port definitions for curio.
//!
//! This crate defines the "ports" (repository, cache, counter, key-store,
//! LLM and embedding traits) that the infrastructure layer implements, and
//! the business logic built on them: intent analysis, the scoring engines,
//! the quota manager and the recommender itself. It depends only on
//! `curio-types` -- never on `curio-infra` or any database/IO crate.

pub mod cache;
pub mod embedding;
pub mod intent;
pub mod llm;
pub mod orchestrator;
pub mod quota;
pub mod repository;
pub mod scoring;

#[cfg(test)]
pub(crate) mod testing;
