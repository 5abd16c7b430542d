/// PostgreSQL plumbing for TaskDesk
///
/// - `pool`: connection pool construction and health checks
/// - `migrations`: applies the schema in `taskdesk-shared/migrations`
///
/// Row mapping lives in [`crate::models`]; the service layer talks to the
/// database only through [`crate::store::PgStore`].

pub mod migrations;
pub mod pool;
