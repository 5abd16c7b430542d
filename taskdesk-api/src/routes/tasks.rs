/// Task endpoints
///
/// - `GET /v1/projects/:id/tasks` - tasks in display order with counts
/// - `POST /v1/projects/:id/tasks` - create a task in the project
/// - `DELETE /v1/projects/:id/tasks/:task_id` - delete a task of the project
/// - `PUT /v1/tasks/:id` - overwrite a task's editable fields
/// - `POST /v1/tasks/:id/toggle` - flip completion

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskdesk_shared::auth::authorization::CurrentUser;
use taskdesk_shared::models::task::{Priority, Task};
use taskdesk_shared::services::tasks::{TaskInput, TaskList, TaskUpdate};

/// New task body; the project comes from the path
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub assigned_to_id: i64,

    pub title: String,

    pub description: String,

    pub due_date: DateTime<Utc>,

    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub id: i64,
    pub is_complete: bool,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<TaskList>> {
    Ok(Json(state.tasks.list_tasks_for_project(project_id).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(project_id): Path<i64>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(req) = payload?;

    let input = TaskInput {
        project_id,
        assigned_to_id: req.assigned_to_id,
        title: req.title,
        description: req.description,
        due_date: req.due_date,
        priority: req.priority,
    };

    let task = state.tasks.create_task(input, Some(&current)).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    payload: Result<Json<TaskUpdate>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let Json(input) = payload?;
    let task = state.tasks.update_task(id, input, Some(&current)).await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path((project_id, id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    state.tasks.delete_task(id, project_id, Some(&current)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ToggleResponse>> {
    let is_complete = state.tasks.toggle_complete(id, Some(&current)).await?;
    Ok(Json(ToggleResponse { id, is_complete }))
}
