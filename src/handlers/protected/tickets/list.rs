use axum::extract::{Extension, State};

use crate::auth::AuthUser;
use crate::database::models::{StatusCounts, TicketSummary};
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

/// GET /tickets - newest first; employees only see tickets they created
pub async fn tickets_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<TicketSummary>> {
    let tickets = state.tickets.list(&user).await?;
    Ok(ApiResponse::success(tickets))
}

/// GET /tickets/summary - `{total, open, inProgress, resolved, closed}`
pub async fn summary_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<StatusCounts> {
    let counts = state.tickets.summary(&user).await?;
    Ok(ApiResponse::success(counts))
}
