/// Role-based authorization policy
///
/// [`authorize`] is a pure function: it looks only at the caller and the
/// action, never at the store. Services load whatever the action needs (for
/// example a project's owner) before asking.
///
/// # Rules
///
/// | Action         | Allowed                                  |
/// |----------------|------------------------------------------|
/// | CreateProject  | Manager, TeamLeader                      |
/// | EditProject    | Manager, TeamLeader                      |
/// | DeleteProject  | Manager, TeamLeader, or the owner        |
/// | CreateTask     | Manager, TeamLeader                      |
/// | EditTask       | any signed-in user                       |
/// | DeleteTask     | Manager, TeamLeader                      |
/// | ToggleTask     | Contributor                              |
/// | ManageUsers    | Manager                                  |
///
/// Without a current user every action is denied.
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::authorization::{authorize, Action, AuthzError, CurrentUser};
/// use taskdesk_shared::models::user::Role;
///
/// let bob = CurrentUser { id: 2, email: "bob@example.com".into(), role: Role::Contributor };
///
/// assert!(authorize(Some(&bob), Action::ToggleTask).is_ok());
/// assert!(authorize(Some(&bob), Action::DeleteProject { owner_id: 2 }).is_ok());
/// assert!(matches!(
///     authorize(Some(&bob), Action::CreateProject),
///     Err(AuthzError::Forbidden { .. })
/// ));
/// assert!(matches!(authorize(None, Action::EditTask), Err(AuthzError::Unauthenticated)));
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::user::Role;

/// The signed-in user a request acts for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateProject,
    EditProject,
    DeleteProject { owner_id: i64 },
    CreateTask,
    EditTask,
    DeleteTask,
    ToggleTask,
    ManageUsers,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::CreateProject => "create projects",
            Action::EditProject => "edit projects",
            Action::DeleteProject { .. } => "delete this project",
            Action::CreateTask => "create tasks",
            Action::EditTask => "edit tasks",
            Action::DeleteTask => "delete tasks",
            Action::ToggleTask => "toggle task completion",
            Action::ManageUsers => "manage users",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Role {role} may not {action}")]
    Forbidden { action: Action, role: Role },
}

/// Decides whether `actor` may perform `action`
pub fn authorize(actor: Option<&CurrentUser>, action: Action) -> Result<(), AuthzError> {
    let actor = actor.ok_or(AuthzError::Unauthenticated)?;

    let allowed = match action {
        Action::CreateProject
        | Action::EditProject
        | Action::CreateTask
        | Action::DeleteTask => actor.role.leads_projects(),
        Action::DeleteProject { owner_id } => {
            actor.role.leads_projects() || actor.id == owner_id
        }
        Action::EditTask => true,
        Action::ToggleTask => actor.role == Role::Contributor,
        Action::ManageUsers => actor.role.manages_users(),
    };

    if allowed {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            action,
            role: actor.role,
        })
    }
}
