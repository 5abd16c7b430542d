use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::error::{rejected, store_failure};
use super::{authorize_actor, ServiceError, ServiceResult};
use crate::auth::authorization::{Action, CurrentUser};
use crate::models::task::{NewTask, Priority, Task, TaskChanges, TaskCounts};
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    pub project_id: i64,

    pub assigned_to_id: i64,

    #[validate(length(min = 1, max = 100, message = "Title is required (at most 100 characters)"))]
    pub title: String,

    #[validate(length(min = 1, max = 500, message = "Description is required (at most 500 characters)"))]
    pub description: String,

    pub due_date: DateTime<Utc>,

    #[serde(default)]
    pub priority: Priority,
}

/// Replacement values for every editable task field
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 100, message = "Title is required (at most 100 characters)"))]
    pub title: String,

    #[validate(length(min = 1, max = 500, message = "Description is required (at most 500 characters)"))]
    pub description: String,

    pub due_date: DateTime<Utc>,

    pub is_complete: bool,

    pub priority: Priority,

    pub assigned_to_id: i64,
}

/// A project's tasks in display order with summary counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub project_id: i64,
    pub tasks: Vec<Task>,
    pub counts: TaskCounts,
}

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Tasks ordered High → Medium → Low, then by due date, then ID
    #[tracing::instrument(skip(self))]
    pub async fn list_tasks_for_project(&self, project_id: i64) -> ServiceResult<TaskList> {
        if !self.store.project_exists(project_id).await.map_err(store_failure)? {
            return Err(rejected(ServiceError::not_found("Project", project_id)));
        }

        let tasks = self
            .store
            .list_tasks_for_project(project_id)
            .await
            .map_err(store_failure)?;

        Ok(TaskList {
            project_id,
            counts: TaskCounts::tally(&tasks),
            tasks,
        })
    }

    /// Creates an incomplete task
    ///
    /// # Errors
    ///
    /// - `Authorization` unless the caller is a Manager or TeamLeader
    /// - `Validation` for bad fields, an unknown project or an unknown assignee
    #[tracing::instrument(
        skip_all,
        fields(project_id = input.project_id, user_id = current.map(|u| u.id))
    )]
    pub async fn create_task(
        &self,
        input: TaskInput,
        current: Option<&CurrentUser>,
    ) -> ServiceResult<Task> {
        authorize_actor(current, Action::CreateTask)?;

        let input = TaskInput {
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            ..input
        };
        input.validate().map_err(|e| rejected(e.into()))?;

        if !self
            .store
            .project_exists(input.project_id)
            .await
            .map_err(store_failure)?
        {
            return Err(rejected(unknown_project()));
        }
        self.require_assignee(input.assigned_to_id).await?;

        let task = self
            .store
            .create_task(NewTask {
                project_id: input.project_id,
                assigned_to_id: input.assigned_to_id,
                title: input.title,
                description: input.description,
                due_date: input.due_date,
                priority: input.priority,
            })
            .await
            .map_err(|e| match e {
                StoreError::MissingReference(constraint) => {
                    rejected(missing_reference(&constraint))
                }
                other => store_failure(other),
            })?;

        info!(task_id = task.id, "Task created");
        Ok(task)
    }

    /// Overwrites every editable field of a task
    ///
    /// Concurrent edits are last-writer-wins.
    #[tracing::instrument(skip_all, fields(task_id = id, user_id = current.map(|u| u.id)))]
    pub async fn update_task(
        &self,
        id: i64,
        input: TaskUpdate,
        current: Option<&CurrentUser>,
    ) -> ServiceResult<Task> {
        authorize_actor(current, Action::EditTask)?;
        self.load(id).await?;

        let input = TaskUpdate {
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            ..input
        };
        input.validate().map_err(|e| rejected(e.into()))?;
        self.require_assignee(input.assigned_to_id).await?;

        let changes = TaskChanges {
            title: input.title,
            description: input.description,
            due_date: input.due_date,
            is_complete: input.is_complete,
            priority: input.priority,
            assigned_to_id: input.assigned_to_id,
        };

        let task = self
            .store
            .update_task(id, changes)
            .await
            .map_err(|e| match e {
                StoreError::MissingReference(_) => rejected(unknown_assignee()),
                other => store_failure(other),
            })?
            .ok_or_else(|| rejected(ServiceError::not_found("Task", id)))?;

        info!("Task updated");
        Ok(task)
    }

    /// Deletes a task that belongs to `project_id`
    #[tracing::instrument(
        skip_all,
        fields(task_id = id, project_id = project_id, user_id = current.map(|u| u.id))
    )]
    pub async fn delete_task(
        &self,
        id: i64,
        project_id: i64,
        current: Option<&CurrentUser>,
    ) -> ServiceResult<()> {
        authorize_actor(current, Action::DeleteTask)?;

        if !self
            .store
            .delete_task(id, project_id)
            .await
            .map_err(store_failure)?
        {
            return Err(rejected(ServiceError::not_found("Task", id)));
        }

        info!("Task deleted");
        Ok(())
    }

    /// Flips completion and returns the new flag
    #[tracing::instrument(skip_all, fields(task_id = id, user_id = current.map(|u| u.id)))]
    pub async fn toggle_complete(
        &self,
        id: i64,
        current: Option<&CurrentUser>,
    ) -> ServiceResult<bool> {
        self.load(id).await?;
        authorize_actor(current, Action::ToggleTask)?;

        let is_complete = self
            .store
            .toggle_task_complete(id)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| rejected(ServiceError::not_found("Task", id)))?;

        info!(is_complete, "Task completion toggled");
        Ok(is_complete)
    }

    async fn load(&self, id: i64) -> ServiceResult<Task> {
        self.store
            .find_task(id)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| rejected(ServiceError::not_found("Task", id)))
    }

    async fn require_assignee(&self, user_id: i64) -> ServiceResult<()> {
        match self.store.find_user(user_id).await.map_err(store_failure)? {
            Some(_) => Ok(()),
            None => Err(rejected(unknown_assignee())),
        }
    }
}

fn unknown_assignee() -> ServiceError {
    ServiceError::invalid("assigned_to_id", "Assigned user does not exist")
}

fn unknown_project() -> ServiceError {
    ServiceError::invalid("project_id", "Project does not exist")
}

/// Picks the rejected field from the violated foreign key
fn missing_reference(constraint: &str) -> ServiceError {
    if constraint == "tasks_project_id_fkey" {
        unknown_project()
    } else {
        unknown_assignee()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::NewProject;
    use crate::models::user::{NewUser, Role};
    use crate::store::MemoryStore;
    use chrono::Duration;

    struct Fixture {
        service: TaskService,
        store: Arc<dyn Store>,
        lead: CurrentUser,
        dev: CurrentUser,
        project_id: i64,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let mut current = Vec::new();
        for (email, role) in [
            ("lead@example.com", Role::TeamLeader),
            ("dev@example.com", Role::Contributor),
        ] {
            let user = store
                .create_user(NewUser {
                    first_name: "Test".to_string(),
                    last_name: "User".to_string(),
                    email: email.to_string(),
                    password_hash: "test_hash".to_string(),
                    role,
                })
                .await
                .unwrap();
            current.push(CurrentUser {
                id: user.id,
                email: user.email,
                role,
            });
        }
        let dev = current.pop().unwrap();
        let lead = current.pop().unwrap();

        let project = store
            .create_project(NewProject {
                name: "Launch".to_string(),
                description: "Q1 launch".to_string(),
                owner_id: lead.id,
                contributor_id: None,
            })
            .await
            .unwrap();

        Fixture {
            service: TaskService::new(store.clone()),
            store,
            lead,
            dev,
            project_id: project.id,
        }
    }

    fn input(fx: &Fixture, title: &str, priority: Priority, due_in_days: i64) -> TaskInput {
        TaskInput {
            project_id: fx.project_id,
            assigned_to_id: fx.dev.id,
            title: title.to_string(),
            description: "Details".to_string(),
            due_date: Utc::now() + Duration::days(due_in_days),
            priority,
        }
    }

    #[tokio::test]
    async fn test_create_validates_field_lengths() {
        let fx = fixture().await;

        let too_long = TaskInput {
            title: "t".repeat(101),
            ..input(&fx, "", Priority::Low, 1)
        };
        let err = fx.service.create_task(too_long, Some(&fx.lead)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let long_description = TaskInput {
            description: "d".repeat(501),
            ..input(&fx, "Ok", Priority::Low, 1)
        };
        assert!(fx.service.create_task(long_description, Some(&fx.lead)).await.is_err());

        let max = TaskInput {
            title: "t".repeat(100),
            description: "d".repeat(500),
            ..input(&fx, "", Priority::Low, 1)
        };
        let task = fx.service.create_task(max, Some(&fx.lead)).await.unwrap();
        assert!(!task.is_complete);
    }

    #[tokio::test]
    async fn test_counts_follow_listing() {
        let fx = fixture().await;
        for (title, priority) in [("a", Priority::High), ("b", Priority::Low), ("c", Priority::Low)] {
            fx.service
                .create_task(input(&fx, title, priority, 1), Some(&fx.lead))
                .await
                .unwrap();
        }

        let list = fx.service.list_tasks_for_project(fx.project_id).await.unwrap();
        assert_eq!(list.counts.total, 3);
        assert_eq!(list.counts.high, 1);
        assert_eq!(list.counts.low, 2);
        assert_eq!(list.counts.pending, 3);
        assert_eq!(list.tasks[0].title, "a");
    }

    #[tokio::test]
    async fn test_update_rejects_vanished_assignee() {
        let fx = fixture().await;
        let task = fx
            .service
            .create_task(input(&fx, "Draft", Priority::Medium, 2), Some(&fx.lead))
            .await
            .unwrap();

        let update = TaskUpdate {
            title: "Draft".to_string(),
            description: "Details".to_string(),
            due_date: task.due_date,
            is_complete: false,
            priority: Priority::High,
            assigned_to_id: 777,
        };
        let err = fx.service.update_task(task.id, update, Some(&fx.dev)).await.unwrap_err();
        match err {
            ServiceError::Validation(fields) => assert_eq!(fields[0].field, "assigned_to_id"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_contributor_may_edit_task() {
        let fx = fixture().await;
        let task = fx
            .service
            .create_task(input(&fx, "Draft", Priority::Medium, 2), Some(&fx.lead))
            .await
            .unwrap();

        let update = TaskUpdate {
            title: " Final ".to_string(),
            description: "Done right".to_string(),
            due_date: task.due_date,
            is_complete: true,
            priority: Priority::Low,
            assigned_to_id: fx.lead.id,
        };
        let updated = fx.service.update_task(task.id, update, Some(&fx.dev)).await.unwrap();

        assert_eq!(updated.title, "Final");
        assert!(updated.is_complete);
        assert_eq!(updated.priority, Priority::Low);
        assert_eq!(updated.assigned_to_id, fx.lead.id);
        assert_eq!(updated.project_id, fx.project_id);
    }

    #[tokio::test]
    async fn test_update_missing_task_is_not_found() {
        let fx = fixture().await;
        let update = TaskUpdate {
            title: "X".to_string(),
            description: "Y".to_string(),
            due_date: Utc::now(),
            is_complete: false,
            priority: Priority::Medium,
            assigned_to_id: fx.dev.id,
        };
        assert!(matches!(
            fx.service.update_task(42, update, Some(&fx.dev)).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_toggle_rules() {
        let fx = fixture().await;
        let task = fx
            .service
            .create_task(input(&fx, "Draft", Priority::Medium, 2), Some(&fx.lead))
            .await
            .unwrap();

        assert!(matches!(
            fx.service.toggle_complete(task.id, Some(&fx.lead)).await,
            Err(ServiceError::Authorization(_))
        ));
        assert!(matches!(
            fx.service.toggle_complete(9999, Some(&fx.dev)).await,
            Err(ServiceError::NotFound { .. })
        ));
        assert!(fx.service.toggle_complete(task.id, Some(&fx.dev)).await.unwrap());

        let stored = fx.store.find_task(task.id).await.unwrap().unwrap();
        assert!(stored.is_complete);
    }

    #[tokio::test]
    async fn test_delete_task_scoped_to_project() {
        let fx = fixture().await;
        let task = fx
            .service
            .create_task(input(&fx, "Draft", Priority::Medium, 2), Some(&fx.lead))
            .await
            .unwrap();

        assert!(matches!(
            fx.service.delete_task(task.id, fx.project_id, Some(&fx.dev)).await,
            Err(ServiceError::Authorization(_))
        ));
        assert!(matches!(
            fx.service.delete_task(task.id, fx.project_id + 1, Some(&fx.lead)).await,
            Err(ServiceError::NotFound { .. })
        ));
        fx.service.delete_task(task.id, fx.project_id, Some(&fx.lead)).await.unwrap();
        assert!(fx.store.find_task(task.id).await.unwrap().is_none());
    }

    #[test]
    fn test_missing_reference_names_the_right_field() {
        let field = |err: ServiceError| match err {
            ServiceError::Validation(fields) => fields[0].field.clone(),
            other => panic!("unexpected error: {:?}", other),
        };

        assert_eq!(field(missing_reference("tasks_project_id_fkey")), "project_id");
        assert_eq!(field(missing_reference("tasks_assigned_to_id_fkey")), "assigned_to_id");
    }

    #[test]
    fn test_update_requires_completion_and_priority() {
        let partial = serde_json::json!({
            "title": "Draft",
            "description": "Outline",
            "due_date": "2030-01-15T09:00:00Z",
            "assigned_to_id": 1,
        });
        assert!(serde_json::from_value::<TaskUpdate>(partial).is_err());

        let full = serde_json::json!({
            "title": "Draft",
            "description": "Outline",
            "due_date": "2030-01-15T09:00:00Z",
            "is_complete": true,
            "priority": "High",
            "assigned_to_id": 1,
        });
        let update: TaskUpdate = serde_json::from_value(full).unwrap();
        assert!(update.is_complete);
        assert_eq!(update.priority, Priority::High);
    }
}
