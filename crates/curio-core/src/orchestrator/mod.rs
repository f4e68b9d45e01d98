//! Request orchestration: engine selection, fallback, post-processing and
//! the [`Recommender`](recommender::Recommender) pipeline itself.

pub mod postprocess;
pub mod recommender;
pub mod selection;
