/// Persistence boundary for the service layer
///
/// Services never touch SQL directly; they hold an `Arc<dyn Store>`. Two
/// implementations share the same observable behaviour:
///
/// - [`PgStore`]: PostgreSQL through the model functions in [`crate::models`]
/// - [`MemoryStore`]: a single `RwLock`-guarded map set, used by tests and
///   local demos
///
/// # Contract
///
/// Every implementation must:
/// 1. Reject rows that reference missing users/projects with
///    [`StoreError::MissingReference`]
/// 2. Reject a second user with the same email with [`StoreError::Duplicate`]
/// 3. Cascade user deletion to owned projects, their tasks, assigned tasks and
///    sessions, and clear `contributor_id` references
/// 4. Apply `update_project`, `toggle_task_complete` and
///    `delete_project_cascade` atomically
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskdesk_shared::store::{MemoryStore, Store};
///
/// # async fn example() -> Result<(), taskdesk_shared::store::StoreError> {
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
/// assert_eq!(store.count_users().await?, 0);
/// # Ok(())
/// # }
/// ```

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::project::{NewProject, Project, ProjectChanges, ProjectWithOwner};
use crate::models::session::Session;
use crate::models::task::{NewTask, Task, TaskChanges};
use crate::models::user::{NewUser, User, UserSummary};

/// Storage failure, classified so services can react to the constraint kind
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A foreign key named a row that doesn't exist
    #[error("Referenced row does not exist: {0}")]
    MissingReference(String),

    /// A unique constraint was violated
    #[error("Duplicate value violates {0}")]
    Duplicate(String),

    /// Anything else the backend reported
    #[error("Database error: {0}")]
    Database(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db) = err.as_database_error() {
            let constraint = db.constraint().unwrap_or("unknown constraint").to_string();
            if db.is_foreign_key_violation() {
                return StoreError::MissingReference(constraint);
            }
            if db.is_unique_violation() {
                return StoreError::Duplicate(constraint);
            }
        }
        StoreError::Database(err.to_string())
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for health output
    fn backend(&self) -> &'static str;

    /// Checks that the backend can serve requests
    async fn ping(&self) -> StoreResult<()>;

    // Users

    async fn create_user(&self, data: NewUser) -> StoreResult<User>;

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>>;

    /// Looks up a user by (already lowercased) email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn list_users(&self) -> StoreResult<Vec<UserSummary>>;

    async fn count_users(&self) -> StoreResult<i64>;

    /// Deletes a user and everything that cascades from it
    async fn delete_user(&self, id: i64) -> StoreResult<bool>;

    // Projects

    async fn list_projects(&self) -> StoreResult<Vec<ProjectWithOwner>>;

    async fn find_project(&self, id: i64) -> StoreResult<Option<Project>>;

    async fn project_exists(&self, id: i64) -> StoreResult<bool>;

    async fn create_project(&self, data: NewProject) -> StoreResult<Project>;

    /// Writes `changes` only if the stored version equals `expected_version`
    ///
    /// Returns None when the row is gone or the version moved on.
    async fn update_project(
        &self,
        id: i64,
        expected_version: i32,
        changes: ProjectChanges,
    ) -> StoreResult<Option<Project>>;

    /// Removes a project and its tasks; Some(task count) or None if absent
    async fn delete_project_cascade(&self, id: i64) -> StoreResult<Option<u64>>;

    // Tasks

    /// Tasks of one project in listing order
    async fn list_tasks_for_project(&self, project_id: i64) -> StoreResult<Vec<Task>>;

    async fn find_task(&self, id: i64) -> StoreResult<Option<Task>>;

    async fn create_task(&self, data: NewTask) -> StoreResult<Task>;

    async fn update_task(&self, id: i64, changes: TaskChanges) -> StoreResult<Option<Task>>;

    /// Flips completion; returns the new flag or None if the task is absent
    async fn toggle_task_complete(&self, id: i64) -> StoreResult<Option<bool>>;

    /// Deletes the task only when it belongs to `project_id`
    async fn delete_task(&self, id: i64, project_id: i64) -> StoreResult<bool>;

    // Sessions

    async fn create_session(&self, user_id: i64, expires_at: DateTime<Utc>)
        -> StoreResult<Session>;

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>>;

    async fn delete_session(&self, id: Uuid) -> StoreResult<bool>;

    /// Drops sessions whose expiry is at or before `now`; returns how many
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_classify_as_database() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));

        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(err.to_string().starts_with("Database error"));
    }
}
