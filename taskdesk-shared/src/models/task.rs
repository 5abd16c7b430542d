/// Task model and database operations
///
/// A task belongs to exactly one project and is assigned to exactly one user.
/// Deleting either parent deletes the task. Completion is a plain boolean that
/// flips with [`Task::toggle_complete`].
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     project_id BIGINT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     assigned_to_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(100) NOT NULL,
///     description VARCHAR(500) NOT NULL,
///     is_complete BOOLEAN NOT NULL DEFAULT FALSE,
///     due_date TIMESTAMPTZ NOT NULL,
///     priority task_priority NOT NULL DEFAULT 'medium',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use chrono::{Duration, Utc};
/// use taskdesk_shared::models::task::{NewTask, Priority, Task};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, project_id: i64, bob_id: i64) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, NewTask {
///     project_id,
///     assigned_to_id: bob_id,
///     title: "Draft outline".to_string(),
///     description: "First pass".to_string(),
///     due_date: Utc::now() + Duration::days(7),
///     priority: Priority::High,
/// }).await?;
///
/// let done = Task::toggle_complete(&pool, task.id).await?;
/// assert_eq!(done, Some(true));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// Sort key for listings: High first, Low last
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,

    pub project_id: i64,

    pub assigned_to_id: i64,

    pub title: String,

    pub description: String,

    pub is_complete: bool,

    pub due_date: DateTime<Utc>,

    pub priority: Priority,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Listing order: priority (High first), then earlier due date, then ID
    pub fn listing_key(&self) -> (u8, DateTime<Utc>, i64) {
        (self.priority.rank(), self.due_date, self.id)
    }
}

/// Input for inserting a task; new tasks always start incomplete
#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: i64,
    pub assigned_to_id: i64,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
}

/// Full replacement of a task's editable fields
#[derive(Debug, Clone)]
pub struct TaskChanges {
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub is_complete: bool,
    pub priority: Priority,
    pub assigned_to_id: i64,
}

/// Summary counts shown alongside a project's task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TaskCounts {
    pub fn tally(tasks: &[Task]) -> Self {
        tasks.iter().fold(TaskCounts::default(), |mut counts, task| {
            counts.total += 1;
            if task.is_complete {
                counts.completed += 1;
            } else {
                counts.pending += 1;
            }
            match task.priority {
                Priority::High => counts.high += 1,
                Priority::Medium => counts.medium += 1,
                Priority::Low => counts.low += 1,
            }
            counts
        })
    }
}

impl Task {
    /// Inserts a task
    ///
    /// # Errors
    ///
    /// Fails with a foreign-key violation when the project or assignee is missing.
    pub async fn create(pool: &PgPool, data: NewTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (project_id, assigned_to_id, title, description, due_date, priority)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, project_id, assigned_to_id, title, description, is_complete,
                      due_date, priority, created_at, updated_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.assigned_to_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.due_date)
        .bind(data.priority)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, assigned_to_id, title, description, is_complete,
                   due_date, priority, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists a project's tasks in listing order
    pub async fn list_by_project(pool: &PgPool, project_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, assigned_to_id, title, description, is_complete,
                   due_date, priority, created_at, updated_at
            FROM tasks
            WHERE project_id = $1
            ORDER BY CASE priority
                         WHEN 'high' THEN 0
                         WHEN 'medium' THEN 1
                         ELSE 2
                     END,
                     due_date,
                     id
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Overwrites every editable field; last writer wins
    ///
    /// # Returns
    ///
    /// The updated task, or None if it no longer exists
    pub async fn update(
        pool: &PgPool,
        id: i64,
        changes: TaskChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = $2,
                description = $3,
                due_date = $4,
                is_complete = $5,
                priority = $6,
                assigned_to_id = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, project_id, assigned_to_id, title, description, is_complete,
                      due_date, priority, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.due_date)
        .bind(changes.is_complete)
        .bind(changes.priority)
        .bind(changes.assigned_to_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Flips `is_complete` in a single statement
    ///
    /// # Returns
    ///
    /// The new completion flag, or None if the task doesn't exist
    pub async fn toggle_complete(pool: &PgPool, id: i64) -> Result<Option<bool>, sqlx::Error> {
        let flag: Option<bool> = sqlx::query_scalar(
            r#"
            UPDATE tasks
            SET is_complete = NOT is_complete, updated_at = NOW()
            WHERE id = $1
            RETURNING is_complete
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(flag)
    }

    /// Deletes a task only if it belongs to `project_id`
    pub async fn delete_in_project(
        pool: &PgPool,
        id: i64,
        project_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND project_id = $2")
            .bind(id)
            .bind(project_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task(id: i64, priority: Priority, due_in_days: i64, is_complete: bool) -> Task {
        let now = Utc::now();
        Task {
            id,
            project_id: 1,
            assigned_to_id: 2,
            title: format!("Task {}", id),
            description: "Something to do".to_string(),
            is_complete,
            due_date: now + Duration::days(due_in_days),
            priority,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_priority_default_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_priority_serializes_with_variant_names() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"High\"");
        let parsed: Priority = serde_json::from_str("\"Low\"").unwrap();
        assert_eq!(parsed, Priority::Low);
    }

    #[test]
    fn test_listing_key_orders_high_medium_low_then_due_date() {
        let mut tasks = vec![
            task(1, Priority::Low, 1, false),
            task(2, Priority::Medium, 5, false),
            task(3, Priority::High, 9, false),
            task(4, Priority::Medium, 2, false),
        ];
        tasks.sort_by_key(Task::listing_key);

        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 4, 2, 1]);
    }

    #[test]
    fn test_counts_tally() {
        let tasks = vec![
            task(1, Priority::High, 1, true),
            task(2, Priority::High, 2, false),
            task(3, Priority::Low, 3, false),
        ];

        let counts = TaskCounts::tally(&tasks);
        assert_eq!(
            counts,
            TaskCounts {
                total: 3,
                completed: 1,
                pending: 2,
                high: 2,
                medium: 0,
                low: 1,
            }
        );
        assert_eq!(TaskCounts::tally(&[]), TaskCounts::default());
    }
}
