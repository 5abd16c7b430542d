use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::project::{NewProject, Project, ProjectChanges, ProjectWithOwner};
use crate::models::session::Session;
use crate::models::task::{NewTask, Task, TaskChanges};
use crate::models::user::{NewUser, User, UserSummary};

#[derive(Default)]
struct State {
    users: BTreeMap<i64, User>,
    projects: BTreeMap<i64, Project>,
    tasks: BTreeMap<i64, Task>,
    sessions: HashMap<Uuid, Session>,
    next_user_id: i64,
    next_project_id: i64,
    next_task_id: i64,
}

impl State {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn require_user(&self, id: i64, constraint: &str) -> StoreResult<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::MissingReference(constraint.to_string()))
        }
    }
}

/// In-process [`Store`] with the same constraint and cascade rules as the
/// PostgreSQL schema
///
/// All access goes through one `RwLock`, so every trait method is atomic.
/// IDs are assigned from per-table counters starting at 1.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, data: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.email == data.email) {
            return Err(StoreError::Duplicate("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: State::next_id(&mut state.next_user_id),
            first_name: data.first_name,
            last_name: data.last_name,
            email: data.email,
            password_hash: data.password_hash,
            role: data.role,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<UserSummary>> {
        let state = self.state.read().await;
        Ok(state.users.values().map(User::summary).collect())
    }

    async fn count_users(&self) -> StoreResult<i64> {
        Ok(self.state.read().await.users.len() as i64)
    }

    async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        if state.users.remove(&id).is_none() {
            return Ok(false);
        }

        let owned: Vec<i64> = state
            .projects
            .values()
            .filter(|p| p.owner_id == id)
            .map(|p| p.id)
            .collect();
        for project_id in &owned {
            state.projects.remove(project_id);
        }

        state
            .tasks
            .retain(|_, t| t.assigned_to_id != id && !owned.contains(&t.project_id));
        state.sessions.retain(|_, s| s.user_id != id);

        for project in state.projects.values_mut() {
            if project.contributor_id == Some(id) {
                project.contributor_id = None;
            }
        }

        Ok(true)
    }

    async fn list_projects(&self) -> StoreResult<Vec<ProjectWithOwner>> {
        let state = self.state.read().await;

        let projects = state
            .projects
            .values()
            .filter_map(|project| {
                state.users.get(&project.owner_id).map(|owner| ProjectWithOwner {
                    project: project.clone(),
                    owner: owner.summary(),
                })
            })
            .collect();

        Ok(projects)
    }

    async fn find_project(&self, id: i64) -> StoreResult<Option<Project>> {
        Ok(self.state.read().await.projects.get(&id).cloned())
    }

    async fn project_exists(&self, id: i64) -> StoreResult<bool> {
        Ok(self.state.read().await.projects.contains_key(&id))
    }

    async fn create_project(&self, data: NewProject) -> StoreResult<Project> {
        let mut state = self.state.write().await;

        state.require_user(data.owner_id, "projects_owner_id_fkey")?;
        if let Some(contributor_id) = data.contributor_id {
            state.require_user(contributor_id, "projects_contributor_id_fkey")?;
        }

        let now = Utc::now();
        let project = Project {
            id: State::next_id(&mut state.next_project_id),
            name: data.name,
            description: data.description,
            owner_id: data.owner_id,
            contributor_id: data.contributor_id,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        state.projects.insert(project.id, project.clone());

        Ok(project)
    }

    async fn update_project(
        &self,
        id: i64,
        expected_version: i32,
        changes: ProjectChanges,
    ) -> StoreResult<Option<Project>> {
        let mut state = self.state.write().await;

        match state.projects.get_mut(&id) {
            Some(project) if project.version == expected_version => {
                project.name = changes.name;
                project.description = changes.description;
                project.version += 1;
                project.updated_at = Utc::now();
                Ok(Some(project.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_project_cascade(&self, id: i64) -> StoreResult<Option<u64>> {
        let mut state = self.state.write().await;

        if state.projects.remove(&id).is_none() {
            return Ok(None);
        }

        let before = state.tasks.len();
        state.tasks.retain(|_, t| t.project_id != id);

        Ok(Some((before - state.tasks.len()) as u64))
    }

    async fn list_tasks_for_project(&self, project_id: i64) -> StoreResult<Vec<Task>> {
        let state = self.state.read().await;

        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect();
        tasks.sort_by_key(Task::listing_key);

        Ok(tasks)
    }

    async fn find_task(&self, id: i64) -> StoreResult<Option<Task>> {
        Ok(self.state.read().await.tasks.get(&id).cloned())
    }

    async fn create_task(&self, data: NewTask) -> StoreResult<Task> {
        let mut state = self.state.write().await;

        if !state.projects.contains_key(&data.project_id) {
            return Err(StoreError::MissingReference(
                "tasks_project_id_fkey".to_string(),
            ));
        }
        state.require_user(data.assigned_to_id, "tasks_assigned_to_id_fkey")?;

        let now = Utc::now();
        let task = Task {
            id: State::next_id(&mut state.next_task_id),
            project_id: data.project_id,
            assigned_to_id: data.assigned_to_id,
            title: data.title,
            description: data.description,
            is_complete: false,
            due_date: data.due_date,
            priority: data.priority,
            created_at: now,
            updated_at: now,
        };
        state.tasks.insert(task.id, task.clone());

        Ok(task)
    }

    async fn update_task(&self, id: i64, changes: TaskChanges) -> StoreResult<Option<Task>> {
        let mut state = self.state.write().await;

        if !state.tasks.contains_key(&id) {
            return Ok(None);
        }
        state.require_user(changes.assigned_to_id, "tasks_assigned_to_id_fkey")?;

        let updated = state.tasks.get_mut(&id).map(|task| {
            task.title = changes.title;
            task.description = changes.description;
            task.due_date = changes.due_date;
            task.is_complete = changes.is_complete;
            task.priority = changes.priority;
            task.assigned_to_id = changes.assigned_to_id;
            task.updated_at = Utc::now();
            task.clone()
        });

        Ok(updated)
    }

    async fn toggle_task_complete(&self, id: i64) -> StoreResult<Option<bool>> {
        let mut state = self.state.write().await;

        Ok(state.tasks.get_mut(&id).map(|task| {
            task.is_complete = !task.is_complete;
            task.updated_at = Utc::now();
            task.is_complete
        }))
    }

    async fn delete_task(&self, id: i64, project_id: i64) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        let in_project = state
            .tasks
            .get(&id)
            .map_or(false, |t| t.project_id == project_id);
        if in_project {
            state.tasks.remove(&id);
        }

        Ok(in_project)
    }

    async fn create_session(
        &self,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<Session> {
        let mut state = self.state.write().await;

        state.require_user(user_id, "sessions_user_id_fkey")?;

        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            created_at: Utc::now(),
            expires_at,
        };
        state.sessions.insert(session.id, session.clone());

        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>> {
        Ok(self.state.read().await.sessions.get(&id).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.state.write().await.sessions.remove(&id).is_some())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - state.sessions.len()) as u64)
    }
}
