/// User management endpoints
///
/// - `GET /v1/users` - everyone, for assignee pickers
/// - `POST /v1/users` - create an account (Manager only)
/// - `DELETE /v1/users/:id` - delete an account and everything it owns (Manager only)

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use taskdesk_shared::auth::authorization::CurrentUser;
use taskdesk_shared::models::user::UserSummary;
use taskdesk_shared::services::users::UserInput;

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.users.list_users().await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserSummary>)> {
    let Json(input) = payload?;
    let user = state.users.create_user(input, Some(&current)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.users.delete_user(id, Some(&current)).await?;
    Ok(StatusCode::NO_CONTENT)
}
