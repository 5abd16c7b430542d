use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use validator::ValidationErrors;

use crate::auth::authorization::AuthzError;
use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// One rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Why a service call did not go through
///
/// Nothing is written when any of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Authorization(#[from] AuthzError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The row changed between load and save
    #[error("{entity} {id} was changed by someone else; reload and try again")]
    Concurrency { entity: &'static str, id: i64 },

    #[error(transparent)]
    Persistence(#[from] StoreError),

    #[error(transparent)]
    Hashing(#[from] PasswordError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        ServiceError::NotFound { entity, id }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    FieldError::new(
                        field,
                        error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid {}", field)),
                    )
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));

        ServiceError::Validation(fields)
    }
}

fn summarize(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Logs a rejected request at `warn` and hands the error back
pub(crate) fn rejected(err: ServiceError) -> ServiceError {
    warn!(error = %err, "Request rejected");
    err
}

/// Logs a storage failure at `error` and wraps it
pub(crate) fn store_failure(err: StoreError) -> ServiceError {
    error!(error = %err, "Store operation failed");
    ServiceError::Persistence(err)
}
