/// API route handlers, one module per resource
///
/// Handlers stay thin: extract, call the matching service with the
/// current user, and let `ApiError` map the outcome.

pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;
