/// Database models for TaskDesk
///
/// Each model owns its SQL: plain `sqlx::query_as` calls against a `PgPool`.
///
/// - `user`: accounts and the `Role` enum
/// - `project`: projects with optimistic versioning and cascade delete
/// - `task`: tasks, the `Priority` enum and listing counts
/// - `session`: server-side bearer token sessions
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskdesk_shared::models::project::Project;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::new(std::env::var("DATABASE_URL")?, 5)).await?;
/// for entry in Project::list_with_owner(&pool).await? {
///     println!("{} (owner {})", entry.project.name, entry.owner.display_name());
/// }
/// # Ok(())
/// # }
/// ```

pub mod project;
pub mod session;
pub mod task;
pub mod user;
