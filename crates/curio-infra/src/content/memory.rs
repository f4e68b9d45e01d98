//! In-memory [`ContentRepository`] over a JSON snapshot.
//!
//! Items are either owned by one user or globally shared (`owner: null`).
//! A user only ever sees their own items plus shared ones; project filters
//! narrow that set to items linked to the project.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use curio_core::repository::content::ContentRepository;
use curio_types::candidate::{Candidate, ContentAnalysis};
use curio_types::error::RepositoryError;
use curio_types::identity::{CandidateId, ProjectId, TaskId, UserId};
use curio_types::intent::ProjectContext;
use curio_types::interaction::Interaction;

/// A saved item with its ownership and project links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredItem {
    /// `None` for globally shared items.
    #[serde(default)]
    pub owner: Option<UserId>,
    #[serde(default)]
    pub projects: Vec<ProjectId>,
    #[serde(flatten)]
    pub candidate: Candidate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTask {
    pub id: TaskId,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProject {
    pub id: ProjectId,
    pub owner: UserId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<StoredTask>,
}

/// On-disk shape of the repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentSnapshot {
    #[serde(default)]
    pub items: Vec<StoredItem>,
    #[serde(default)]
    pub projects: Vec<StoredProject>,
    #[serde(default)]
    pub interactions: HashMap<UserId, Vec<Interaction>>,
}

#[derive(Debug, Default)]
pub struct InMemoryContentRepository {
    items: Vec<StoredItem>,
    index: HashMap<CandidateId, usize>,
    projects: HashMap<ProjectId, StoredProject>,
    interactions: HashMap<UserId, Vec<Interaction>>,
}

impl InMemoryContentRepository {
    pub fn new(snapshot: ContentSnapshot) -> Self {
        let mut repo = Self::default();
        for item in snapshot.items {
            repo.insert_item(item);
        }
        for project in snapshot.projects {
            repo.projects.insert(project.id, project);
        }
        for (user, mut history) in snapshot.interactions {
            history.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
            repo.interactions.insert(user, history);
        }
        repo
    }

    /// Load a snapshot file. A missing file yields an empty repository.
    pub async fn load(path: &Path) -> Result<Self, RepositoryError> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "content snapshot not found, starting empty");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(RepositoryError::Query(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };
        let snapshot: ContentSnapshot = serde_json::from_str(&contents).map_err(|e| {
            RepositoryError::Query(format!("invalid content snapshot {}: {e}", path.display()))
        })?;
        let repo = Self::new(snapshot);
        tracing::info!(
            path = %path.display(),
            items = repo.items.len(),
            projects = repo.projects.len(),
            "loaded content snapshot"
        );
        Ok(repo)
    }

    /// Insert or replace an item (matched by candidate id).
    pub fn insert_item(&mut self, item: StoredItem) {
        match self.index.get(&item.candidate.id) {
            Some(&pos) => self.items[pos] = item,
            None => {
                self.index.insert(item.candidate.id, self.items.len());
                self.items.push(item);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl StoredItem {
    fn visible_to(&self, user_id: &UserId) -> bool {
        self.owner.as_ref().is_none_or(|owner| owner == user_id)
    }
}

impl ContentRepository for InMemoryContentRepository {
    async fn get_candidates(
        &self,
        user_id: &UserId,
        project_id: Option<ProjectId>,
        limit: Option<usize>,
    ) -> Result<Vec<Candidate>, RepositoryError> {
        let mut candidates: Vec<Candidate> = self
            .items
            .iter()
            .filter(|item| item.visible_to(user_id))
            .filter(|item| project_id.is_none_or(|p| item.projects.contains(&p)))
            .map(|item| item.candidate.clone())
            .collect();

        // Newest first so a limit keeps the most recent items.
        candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        if let Some(limit) = limit {
            candidates.truncate(limit);
        }
        Ok(candidates)
    }

    async fn get_cached_analysis(
        &self,
        content_id: CandidateId,
    ) -> Result<Option<ContentAnalysis>, RepositoryError> {
        Ok(self
            .index
            .get(&content_id)
            .and_then(|&pos| self.items[pos].candidate.cached_analysis.clone()))
    }

    async fn get_project_context(
        &self,
        user_id: &UserId,
        project_id: ProjectId,
        task_id: Option<TaskId>,
    ) -> Result<Option<ProjectContext>, RepositoryError> {
        let Some(project) = self.projects.get(&project_id) else {
            return Ok(None);
        };
        if &project.owner != user_id {
            return Ok(None);
        }
        let task_title = task_id.and_then(|task_id| {
            project
                .tasks
                .iter()
                .find(|t| t.id == task_id)
                .map(|t| t.title.clone())
        });
        Ok(Some(ProjectContext {
            title: project.title.clone(),
            description: project.description.clone(),
            technologies: project.technologies.clone(),
            task_title,
        }))
    }

    async fn get_interaction_history(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Interaction>, RepositoryError> {
        Ok(self.interactions.get(user_id).cloned().unwrap_or_default())
    }
}
