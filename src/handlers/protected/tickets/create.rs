use axum::extract::{rejection::JsonRejection, Extension, State};
use axum::Json;

use crate::auth::AuthUser;
use crate::database::models::TicketDetail;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::CreateTicketRequest;

/// POST /tickets - create a ticket owned by the requester
///
/// ```json
/// { "title": "Printer broken", "description": "Won't turn on", "priority": "HIGH", "assigneeId": 7 }
/// ```
///
/// Any `status` or creator in the body is ignored; new tickets always start OPEN.
pub async fn ticket_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateTicketRequest>, JsonRejection>,
) -> ApiResult<TicketDetail> {
    let Json(request) = payload?;
    let ticket = state.tickets.create(&user, request).await?;
    Ok(ApiResponse::created(ticket))
}
