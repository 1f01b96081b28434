use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Extension, Path, State,
};
use axum::Json;
use serde::Deserialize;

use super::ticket_id;
use crate::auth::AuthUser;
use crate::database::models::TicketDetail;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub body: Option<String>,
}

/// POST /tickets/:id/comments - `{ "body": "Checked cable" }`
///
/// Answers 201 with the whole ticket, new comment last.
pub async fn comment_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<TicketDetail> {
    let id = ticket_id(path)?;
    let Json(request) = payload?;
    let ticket = state.tickets.add_comment(&user, id, request.body.as_deref()).await?;
    Ok(ApiResponse::created(ticket))
}
