//! # TaskDesk API Server Library
//!
//! HTTP surface for the TaskDesk project tracker. Handlers resolve the
//! bearer session to a current user and hand it to the shared services.
//!
//! ## Modules
//!
//! - `app`: Application state, router and session middleware
//! - `config`: Configuration from the environment
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
