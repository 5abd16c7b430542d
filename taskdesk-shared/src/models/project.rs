/// Project model and database operations
///
/// Every project has exactly one owner (the user who created it) and an
/// optional contributor. `version` starts at 1 and is bumped by every update;
/// [`Project::update_versioned`] only writes when the caller's version still
/// matches the stored one.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL,
///     owner_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     contributor_id BIGINT REFERENCES users(id) ON DELETE SET NULL,
///     version INTEGER NOT NULL DEFAULT 1,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::models::project::{NewProject, Project, ProjectChanges};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, owner_id: i64) -> Result<(), sqlx::Error> {
/// let project = Project::create(&pool, NewProject {
///     name: "Launch".to_string(),
///     description: "Q1 launch".to_string(),
///     owner_id,
///     contributor_id: None,
/// }).await?;
///
/// let changes = ProjectChanges {
///     name: "Launch v2".to_string(),
///     description: "Q2 launch".to_string(),
/// };
/// let updated = Project::update_versioned(&pool, project.id, project.version, changes).await?;
/// assert_eq!(updated.map(|p| p.version), Some(2));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::user::{Role, UserSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,

    pub name: String,

    pub description: String,

    /// Creator of the project, never changes
    pub owner_id: i64,

    pub contributor_id: Option<i64>,

    /// Optimistic concurrency token
    pub version: i32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub owner_id: i64,
    pub contributor_id: Option<i64>,
}

/// Fields an edit may overwrite
#[derive(Debug, Clone)]
pub struct ProjectChanges {
    pub name: String,
    pub description: String,
}

/// Project joined with its owner's summary, as shown in listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectWithOwner {
    #[serde(flatten)]
    pub project: Project,

    pub owner: UserSummary,
}

#[derive(sqlx::FromRow)]
struct ProjectOwnerRow {
    id: i64,
    name: String,
    description: String,
    owner_id: i64,
    contributor_id: Option<i64>,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    owner_first_name: String,
    owner_last_name: String,
    owner_email: String,
    owner_role: Role,
}

impl From<ProjectOwnerRow> for ProjectWithOwner {
    fn from(row: ProjectOwnerRow) -> Self {
        ProjectWithOwner {
            owner: UserSummary {
                id: row.owner_id,
                first_name: row.owner_first_name,
                last_name: row.owner_last_name,
                email: row.owner_email,
                role: row.owner_role,
            },
            project: Project {
                id: row.id,
                name: row.name,
                description: row.description,
                owner_id: row.owner_id,
                contributor_id: row.contributor_id,
                version: row.version,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

impl Project {
    /// Inserts a project at version 1
    ///
    /// # Errors
    ///
    /// Fails with a foreign-key violation when `owner_id` or `contributor_id`
    /// does not name an existing user.
    pub async fn create(pool: &PgPool, data: NewProject) -> Result<Self, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, owner_id, contributor_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, owner_id, contributor_id, version,
                      created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.owner_id)
        .bind(data.contributor_id)
        .fetch_one(pool)
        .await?;

        Ok(project)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, owner_id, contributor_id, version,
                   created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    pub async fn exists(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM projects WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    /// Lists every project with its owner, ordered by ID
    pub async fn list_with_owner(pool: &PgPool) -> Result<Vec<ProjectWithOwner>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ProjectOwnerRow>(
            r#"
            SELECT p.id, p.name, p.description, p.owner_id, p.contributor_id, p.version,
                   p.created_at, p.updated_at,
                   u.first_name AS owner_first_name,
                   u.last_name AS owner_last_name,
                   u.email AS owner_email,
                   u.role AS owner_role
            FROM projects p
            JOIN users u ON u.id = p.owner_id
            ORDER BY p.id
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(ProjectWithOwner::from).collect())
    }

    /// Overwrites name and description if the stored version is `expected_version`
    ///
    /// # Returns
    ///
    /// The updated row, or None when the project is gone or was changed by
    /// someone else since `expected_version` was read.
    pub async fn update_versioned(
        pool: &PgPool,
        id: i64,
        expected_version: i32,
        changes: ProjectChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = $3,
                description = $4,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING id, name, description, owner_id, contributor_id, version,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(changes.name)
        .bind(changes.description)
        .fetch_optional(pool)
        .await?;

        Ok(project)
    }

    /// Deletes the project and all of its tasks in one transaction
    ///
    /// The project row is locked first so a concurrent task insert cannot
    /// slip in between the two deletes.
    ///
    /// # Returns
    ///
    /// Number of tasks removed, or None if the project didn't exist
    pub async fn delete_cascade(pool: &PgPool, id: i64) -> Result<Option<u64>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let tasks = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(tasks))
    }
}
