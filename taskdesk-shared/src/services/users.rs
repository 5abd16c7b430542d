use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::error::{rejected, store_failure};
use super::{authorize_actor, ServiceError, ServiceResult};
use crate::auth::authorization::{Action, CurrentUser};
use crate::auth::password::{hash_password, validate_password_strength};
use crate::models::user::{NewUser, Role, UserSummary};
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserInput {
    #[validate(length(min = 1, max = 100, message = "First name is required (at most 100 characters)"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name is required (at most 100 characters)"))]
    pub last_name: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    pub password: String,

    pub role: Role,
}

impl UserInput {
    /// Trims names and lowercases the email; passwords are taken verbatim
    fn normalized(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            ..self
        }
    }
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Everyone, for assignee pickers; ordered by ID
    #[tracing::instrument(skip_all)]
    pub async fn list_users(&self) -> ServiceResult<Vec<UserSummary>> {
        self.store.list_users().await.map_err(store_failure)
    }

    /// Creates an account with an Argon2id-hashed password
    ///
    /// # Errors
    ///
    /// - `Authorization` unless the caller is a Manager
    /// - `Validation` for bad fields, a weak password, or a taken email
    #[tracing::instrument(skip_all, fields(user_id = current.map(|u| u.id)))]
    pub async fn create_user(
        &self,
        input: UserInput,
        current: Option<&CurrentUser>,
    ) -> ServiceResult<UserSummary> {
        authorize_actor(current, Action::ManageUsers)?;
        self.insert(input.normalized()).await
    }

    /// Deletes a user along with their projects, assigned tasks and sessions
    #[tracing::instrument(skip_all, fields(target_id = id, user_id = current.map(|u| u.id)))]
    pub async fn delete_user(&self, id: i64, current: Option<&CurrentUser>) -> ServiceResult<()> {
        let actor = authorize_actor(current, Action::ManageUsers)?;

        if actor.id == id {
            return Err(rejected(ServiceError::invalid(
                "id",
                "You cannot delete your own account",
            )));
        }

        if !self.store.delete_user(id).await.map_err(store_failure)? {
            return Err(rejected(ServiceError::not_found("User", id)));
        }

        info!("User deleted");
        Ok(())
    }

    /// Seeds a Manager account on an empty store
    ///
    /// # Returns
    ///
    /// The created manager, or None when users already exist
    #[tracing::instrument(skip_all)]
    pub async fn ensure_bootstrap_manager(
        &self,
        email: &str,
        password: &str,
    ) -> ServiceResult<Option<UserSummary>> {
        if self.store.count_users().await.map_err(store_failure)? > 0 {
            return Ok(None);
        }

        let input = UserInput {
            first_name: "Bootstrap".to_string(),
            last_name: "Manager".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: Role::Manager,
        };
        let manager = self.insert(input.normalized()).await?;

        info!(manager_id = manager.id, "Bootstrap manager created");
        Ok(Some(manager))
    }

    async fn insert(&self, input: UserInput) -> ServiceResult<UserSummary> {
        input.validate().map_err(|e| rejected(e.into()))?;
        validate_password_strength(&input.password)
            .map_err(|weak| rejected(ServiceError::invalid("password", weak.to_string())))?;

        if self
            .store
            .find_user_by_email(&input.email)
            .await
            .map_err(store_failure)?
            .is_some()
        {
            return Err(rejected(email_taken()));
        }

        let password_hash = hash_password(&input.password)?;

        let user = self
            .store
            .create_user(NewUser {
                first_name: input.first_name,
                last_name: input.last_name,
                email: input.email,
                password_hash,
                role: input.role,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => rejected(email_taken()),
                other => store_failure(other),
            })?;

        info!(new_user_id = user.id, role = %user.role, "User created");
        Ok(user.summary())
    }
}

fn email_taken() -> ServiceError {
    ServiceError::invalid("email", "Email is already registered")
}
