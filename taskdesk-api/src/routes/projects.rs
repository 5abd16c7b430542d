/// Project endpoints
///
/// - `GET /v1/projects` - all projects with their owners
/// - `POST /v1/projects` - create a project owned by the caller
/// - `GET /v1/projects/:id` - load a project for editing
/// - `PUT /v1/projects/:id` - save an edit; a stale `version` answers 409
/// - `DELETE /v1/projects/:id` - delete a project and its tasks

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskdesk_shared::auth::authorization::CurrentUser;
use taskdesk_shared::models::project::{Project, ProjectWithOwner};
use taskdesk_shared::services::projects::{ProjectInput, ProjectUpdate};

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteProjectResponse {
    pub id: i64,

    /// Tasks removed along with the project
    pub tasks_removed: u64,
}

pub async fn list_projects(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ProjectWithOwner>>> {
    Ok(Json(state.projects.list_projects().await?))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    payload: Result<Json<ProjectInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let Json(input) = payload?;
    let project = state.projects.create_project(input, Some(&current)).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Project>> {
    let project = state.projects.get_project_for_edit(id, Some(&current)).await?;
    Ok(Json(project))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    payload: Result<Json<ProjectUpdate>, JsonRejection>,
) -> ApiResult<Json<Project>> {
    let Json(input) = payload?;
    let project = state.projects.update_project(id, input, Some(&current)).await?;
    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteProjectResponse>> {
    let tasks_removed = state.projects.delete_project(id, Some(&current)).await?;
    Ok(Json(DeleteProjectResponse { id, tasks_removed }))
}
