use axum::extract::State;

use crate::database::models::PublicUser;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

/// GET /users/agents - assignable users ordered by email
pub async fn agents_get(State(state): State<AppState>) -> ApiResult<Vec<PublicUser>> {
    let agents = state.users.assignable_users().await?;
    Ok(ApiResponse::success(agents))
}
