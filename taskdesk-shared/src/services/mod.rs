/// Business operations over projects, tasks and users
///
/// Each service is a cheap `Clone` handle around an `Arc<dyn Store>`. The
/// current user is passed explicitly to every mutating call and checked
/// against [`crate::auth::authorization::authorize`] before anything is
/// written.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskdesk_shared::auth::authorization::CurrentUser;
/// use taskdesk_shared::models::user::Role;
/// use taskdesk_shared::services::projects::{ProjectInput, ProjectService};
/// use taskdesk_shared::store::{MemoryStore, Store};
///
/// # async fn example() -> Result<(), taskdesk_shared::services::ServiceError> {
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
/// let projects = ProjectService::new(store);
///
/// let alice = CurrentUser { id: 1, email: "alice@example.com".into(), role: Role::Manager };
/// let launch = projects
///     .create_project(
///         ProjectInput {
///             name: "Launch".into(),
///             description: "Q1 launch".into(),
///             contributor_id: None,
///         },
///         Some(&alice),
///     )
///     .await?;
/// assert_eq!(launch.owner_id, alice.id);
/// # Ok(())
/// # }
/// ```

mod error;
pub mod projects;
pub mod tasks;
pub mod users;

pub use error::{FieldError, ServiceError, ServiceResult};

use crate::auth::authorization::{authorize, Action, AuthzError, CurrentUser};
use error::rejected;

/// Runs the policy and returns the (now known to be present) actor
pub(crate) fn authorize_actor<'a>(
    actor: Option<&'a CurrentUser>,
    action: Action,
) -> ServiceResult<&'a CurrentUser> {
    authorize(actor, action).map_err(|e| rejected(e.into()))?;
    actor.ok_or_else(|| rejected(AuthzError::Unauthenticated.into()))
}
