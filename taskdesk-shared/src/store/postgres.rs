use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreResult};
use crate::db::pool::health_check;
use crate::models::project::{NewProject, Project, ProjectChanges, ProjectWithOwner};
use crate::models::session::Session;
use crate::models::task::{NewTask, Task, TaskChanges};
use crate::models::user::{NewUser, User, UserSummary};

/// [`Store`] backed by PostgreSQL
///
/// Cascades and `contributor_id` clearing are enforced by the schema's
/// foreign keys; this type only forwards to the model functions.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }

    async fn create_user(&self, data: NewUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn list_users(&self) -> StoreResult<Vec<UserSummary>> {
        Ok(User::list_summaries(&self.pool).await?)
    }

    async fn count_users(&self) -> StoreResult<i64> {
        Ok(User::count(&self.pool).await?)
    }

    async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        Ok(User::delete(&self.pool, id).await?)
    }

    async fn list_projects(&self) -> StoreResult<Vec<ProjectWithOwner>> {
        Ok(Project::list_with_owner(&self.pool).await?)
    }

    async fn find_project(&self, id: i64) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn project_exists(&self, id: i64) -> StoreResult<bool> {
        Ok(Project::exists(&self.pool, id).await?)
    }

    async fn create_project(&self, data: NewProject) -> StoreResult<Project> {
        Ok(Project::create(&self.pool, data).await?)
    }

    async fn update_project(
        &self,
        id: i64,
        expected_version: i32,
        changes: ProjectChanges,
    ) -> StoreResult<Option<Project>> {
        Ok(Project::update_versioned(&self.pool, id, expected_version, changes).await?)
    }

    async fn delete_project_cascade(&self, id: i64) -> StoreResult<Option<u64>> {
        Ok(Project::delete_cascade(&self.pool, id).await?)
    }

    async fn list_tasks_for_project(&self, project_id: i64) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_project(&self.pool, project_id).await?)
    }

    async fn find_task(&self, id: i64) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn create_task(&self, data: NewTask) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn update_task(&self, id: i64, changes: TaskChanges) -> StoreResult<Option<Task>> {
        Ok(Task::update(&self.pool, id, changes).await?)
    }

    async fn toggle_task_complete(&self, id: i64) -> StoreResult<Option<bool>> {
        Ok(Task::toggle_complete(&self.pool, id).await?)
    }

    async fn delete_task(&self, id: i64, project_id: i64) -> StoreResult<bool> {
        Ok(Task::delete_in_project(&self.pool, id, project_id).await?)
    }

    async fn create_session(
        &self,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<Session> {
        Ok(Session::create(&self.pool, user_id, expires_at).await?)
    }

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>> {
        Ok(Session::find_by_id(&self.pool, id).await?)
    }

    async fn delete_session(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Session::delete(&self.pool, id).await?)
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        Ok(Session::delete_expired(&self.pool, now).await?)
    }
}
