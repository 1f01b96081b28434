use axum::extract::{Extension, State};

use crate::auth::AuthUser;
use crate::database::models::PublicUser;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

/// GET /auth/me - profile of the authenticated user, read fresh from the store
pub async fn whoami(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<PublicUser> {
    let profile = state.auth.profile(user.id).await?;
    Ok(ApiResponse::success(profile))
}
