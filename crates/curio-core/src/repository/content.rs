//! Content repository trait definition.

use curio_types::candidate::{Candidate, ContentAnalysis};
use curio_types::error::RepositoryError;
use curio_types::identity::{CandidateId, ProjectId, TaskId, UserId};
use curio_types::intent::ProjectContext;
use curio_types::interaction::Interaction;

/// Read-only view over the external content store.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in curio-infra.
pub trait ContentRepository: Send + Sync {
    /// Candidates visible to `user_id`: the user's own items plus globally
    /// shared ones, optionally narrowed to a project.
    ///
    /// Returns an empty list (not an error) when nothing is eligible.
    /// Implementations must never return another user's private items.
    fn get_candidates(
        &self,
        user_id: &UserId,
        project_id: Option<ProjectId>,
        limit: Option<usize>,
    ) -> impl std::future::Future<Output = Result<Vec<Candidate>, RepositoryError>> + Send;

    /// Latest analysis record for an item, if the pipeline produced one.
    fn get_cached_analysis(
        &self,
        content_id: CandidateId,
    ) -> impl std::future::Future<Output = Result<Option<ContentAnalysis>, RepositoryError>> + Send;

    /// Title, description and stack of a project the user owns.
    fn get_project_context(
        &self,
        user_id: &UserId,
        project_id: ProjectId,
        task_id: Option<TaskId>,
    ) -> impl std::future::Future<Output = Result<Option<ProjectContext>, RepositoryError>> + Send;

    /// The user's past interactions, newest first.
    fn get_interaction_history(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Interaction>, RepositoryError>> + Send;
}
