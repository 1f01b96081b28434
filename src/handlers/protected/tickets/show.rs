use axum::extract::{rejection::PathRejection, Extension, Path, State};

use super::ticket_id;
use crate::auth::AuthUser;
use crate::database::models::TicketDetail;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

/// GET /tickets/:id - full detail with creator, assignee and comments
pub async fn ticket_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<TicketDetail> {
    let id = ticket_id(path)?;
    let ticket = state.tickets.get(&user, id).await?;
    Ok(ApiResponse::success(ticket))
}
