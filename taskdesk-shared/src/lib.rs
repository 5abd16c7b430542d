//! # TaskDesk Shared Library
//!
//! Domain model and business rules for the TaskDesk project tracker, used by
//! the API server and its tests.
//!
//! ## Module Organization
//!
//! - `models`: users, projects, tasks and sessions with their SQL
//! - `store`: the `Store` trait with PostgreSQL and in-memory implementations
//! - `auth`: password hashing, bearer tokens, sessions and the role policy
//! - `services`: project, task and user operations
//! - `db`: connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the TaskDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
