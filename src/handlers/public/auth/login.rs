// handlers/public/auth/login.rs - POST /auth/login handler

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;

use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::{LoginRequest, LoginResponse};

/// POST /auth/login - Authenticate with email and password
///
/// ```json
/// { "email": "admin@example.com", "password": "password123" }
/// ```
///
/// Responds with `{ "token": "...", "user": PublicUser }`. Unknown email and
/// wrong password both answer 401 with the same message.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(request) = payload?;
    let response = state.auth.login(request).await?;
    Ok(ApiResponse::success(response))
}
