use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::error::{rejected, store_failure};
use super::{authorize_actor, ServiceError, ServiceResult};
use crate::auth::authorization::{Action, CurrentUser};
use crate::models::project::{NewProject, Project, ProjectChanges, ProjectWithOwner};
use crate::store::{Store, StoreError};

/// Fields for a new project
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProjectInput {
    #[validate(length(min = 1, max = 200, message = "Name is required (at most 200 characters)"))]
    pub name: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[serde(default)]
    pub contributor_id: Option<i64>,
}

/// Fields an edit may change, plus the version the editor loaded
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProjectUpdate {
    #[validate(length(min = 1, max = 200, message = "Name is required (at most 200 characters)"))]
    pub name: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    /// When absent, the version read inside the update call is used
    #[serde(default)]
    pub version: Option<i32>,
}

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn Store>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// All projects with their owners, ordered by ID
    #[tracing::instrument(skip_all)]
    pub async fn list_projects(&self) -> ServiceResult<Vec<ProjectWithOwner>> {
        self.store.list_projects().await.map_err(store_failure)
    }

    /// Creates a project owned by the caller
    ///
    /// # Errors
    ///
    /// - `Authorization` unless the caller is a Manager or TeamLeader
    /// - `Validation` for blank/over-long fields or an unknown contributor
    #[tracing::instrument(skip_all, fields(user_id = current.map(|u| u.id)))]
    pub async fn create_project(
        &self,
        input: ProjectInput,
        current: Option<&CurrentUser>,
    ) -> ServiceResult<Project> {
        let actor = authorize_actor(current, Action::CreateProject)?;

        let input = ProjectInput {
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            contributor_id: input.contributor_id,
        };
        input.validate().map_err(|e| rejected(e.into()))?;

        if let Some(contributor_id) = input.contributor_id {
            if self.store.find_user(contributor_id).await.map_err(store_failure)?.is_none() {
                return Err(rejected(unknown_contributor()));
            }
        }

        let project = self
            .store
            .create_project(NewProject {
                name: input.name,
                description: input.description,
                owner_id: actor.id,
                contributor_id: input.contributor_id,
            })
            .await
            .map_err(|e| match e {
                StoreError::MissingReference(_) => rejected(unknown_contributor()),
                other => store_failure(other),
            })?;

        info!(project_id = project.id, "Project created");
        Ok(project)
    }

    /// Loads a project for editing, including its current version
    #[tracing::instrument(skip_all, fields(project_id = id, user_id = current.map(|u| u.id)))]
    pub async fn get_project_for_edit(
        &self,
        id: i64,
        current: Option<&CurrentUser>,
    ) -> ServiceResult<Project> {
        let project = self.load(id).await?;
        authorize_actor(current, Action::EditProject)?;
        Ok(project)
    }

    /// Renames/redescribes a project if nobody changed it in the meantime
    ///
    /// The owner is never changed. A failed versioned write is re-checked:
    /// a vanished project reports `NotFound`, a surviving one `Concurrency`.
    #[tracing::instrument(skip_all, fields(project_id = id, user_id = current.map(|u| u.id)))]
    pub async fn update_project(
        &self,
        id: i64,
        input: ProjectUpdate,
        current: Option<&CurrentUser>,
    ) -> ServiceResult<Project> {
        authorize_actor(current, Action::EditProject)?;

        let input = ProjectUpdate {
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            version: input.version,
        };
        input.validate().map_err(|e| rejected(e.into()))?;

        let loaded = self.load(id).await?;
        let expected_version = input.version.unwrap_or(loaded.version);

        let changes = ProjectChanges {
            name: input.name,
            description: input.description,
        };

        let updated = self
            .store
            .update_project(id, expected_version, changes)
            .await
            .map_err(store_failure)?;

        if let Some(project) = updated {
            info!(version = project.version, "Project updated");
            return Ok(project);
        }

        if self.store.project_exists(id).await.map_err(store_failure)? {
            Err(rejected(ServiceError::Concurrency {
                entity: "Project",
                id,
            }))
        } else {
            Err(rejected(ServiceError::not_found("Project", id)))
        }
    }

    /// Deletes a project and all of its tasks
    ///
    /// # Returns
    ///
    /// Number of tasks removed with the project
    #[tracing::instrument(skip_all, fields(project_id = id, user_id = current.map(|u| u.id)))]
    pub async fn delete_project(
        &self,
        id: i64,
        current: Option<&CurrentUser>,
    ) -> ServiceResult<u64> {
        let project = self.load(id).await?;
        authorize_actor(
            current,
            Action::DeleteProject {
                owner_id: project.owner_id,
            },
        )?;

        let removed = self
            .store
            .delete_project_cascade(id)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| rejected(ServiceError::not_found("Project", id)))?;

        info!(tasks_removed = removed, "Project deleted");
        Ok(removed)
    }

    async fn load(&self, id: i64) -> ServiceResult<Project> {
        self.store
            .find_project(id)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| rejected(ServiceError::not_found("Project", id)))
    }
}

fn unknown_contributor() -> ServiceError {
    ServiceError::invalid("contributor_id", "Contributor does not exist")
}
