//! HTTP/REST API layer for curio.
//!
//! Axum-based REST API at `/api/v1/` with the envelope response format and
//! CORS support. Authentication is left to the surrounding gateway.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
