/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskdesk_api::{app::{build_router, AppState}, config::Config};
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskdesk_shared::store::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig::new(config.database.url.clone(), 10)).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use taskdesk_shared::auth::session::SessionManager;
use taskdesk_shared::services::{projects::ProjectService, tasks::TaskService, users::UserService};
use taskdesk_shared::store::Store;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned per request by the `State` extractor; everything inside is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,

    pub config: Arc<Config>,

    pub sessions: SessionManager,

    pub projects: ProjectService,

    pub tasks: TaskService,

    pub users: UserService,
}

impl AppState {
    /// Wires every service to the same store
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let sessions = SessionManager::new(
            store.clone(),
            config.jwt.secret.clone(),
            chrono::Duration::hours(config.jwt.session_ttl_hours),
        );

        Self {
            projects: ProjectService::new(store.clone()),
            tasks: TaskService::new(store.clone()),
            users: UserService::new(store.clone()),
            sessions,
            store,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                          # public
/// └── /v1/
///     ├── POST /auth/login                 # public
///     ├── POST /auth/logout
///     ├── GET|POST /users
///     ├── DELETE /users/:id
///     ├── GET|POST /projects
///     ├── GET|PUT|DELETE /projects/:id
///     ├── GET|POST /projects/:id/tasks
///     ├── DELETE /projects/:id/tasks/:task_id
///     ├── PUT /tasks/:id
///     └── POST /tasks/:id/toggle
/// ```
///
/// Everything under `/v1` except login goes through [`require_session`].
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_routes = Router::new().route("/auth/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route("/auth/logout", post(routes::auth::logout))
        .route(
            "/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route("/users/:id", delete(routes::users::delete_user))
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/projects/:id/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/projects/:id/tasks/:task_id",
            delete(routes::tasks::delete_task),
        )
        .route("/tasks/:id", put(routes::tasks::update_task))
        .route("/tasks/:id/toggle", post(routes::tasks::toggle_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let v1_routes = Router::new().merge(public_routes).merge(protected_routes);

    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Bearer-token session middleware
///
/// Resolves the token to a live session and inserts both the
/// `ResolvedSession` and its `CurrentUser` into request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let session = state.sessions.resolve(token).await?;

    req.extensions_mut().insert(session.user.clone());
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}
