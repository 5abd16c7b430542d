/// Authentication endpoints
///
/// - `POST /v1/auth/login` - exchange email and password for a session token
/// - `POST /v1/auth/logout` - end the session behind the presented token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskdesk_shared::auth::session::{ResolvedSession, SignedIn};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login handler
///
/// # Response
///
/// ```json
/// {
///   "token": "eyJ...",
///   "session_id": "7d0c...",
///   "expires_at": "2025-01-01T12:00:00Z",
///   "user": { "id": 1, "first_name": "Alice", "last_name": "Ng", "email": "alice@example.com", "role": "Manager" }
/// }
/// ```
///
/// Unknown email and wrong password both answer 401 with the same message.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<SignedIn>> {
    let Json(req) = payload?;
    let req = LoginRequest {
        email: req.email.trim().to_string(),
        ..req
    };

    if req.validate().is_err() {
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    }

    let signed_in = state.sessions.sign_in(&req.email, &req.password).await?;
    Ok(Json(signed_in))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<ResolvedSession>,
) -> ApiResult<StatusCode> {
    state.sessions.sign_out(session.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
