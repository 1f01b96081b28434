use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Extension, Path, State,
};
use axum::Json;
use serde::{Deserialize, Deserializer};

use super::ticket_id;
use crate::auth::AuthUser;
use crate::database::models::TicketDetail;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::ServiceError;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PriorityRequest {
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    /// Absent: `None`. Explicit `null`: `Some(None)`, which unassigns.
    #[serde(default, deserialize_with = "present")]
    pub assignee_id: Option<Option<i64>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

/// PATCH /tickets/:id/status - `{ "status": "IN_PROGRESS" }`
pub async fn status_patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<TicketDetail> {
    let id = ticket_id(path)?;
    let Json(request) = payload?;
    let ticket = state.tickets.update_status(&user, id, request.status.as_deref()).await?;
    Ok(ApiResponse::success(ticket))
}

/// PATCH /tickets/:id/priority - `{ "priority": "LOW" }`
pub async fn priority_patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<PriorityRequest>, JsonRejection>,
) -> ApiResult<TicketDetail> {
    let id = ticket_id(path)?;
    let Json(request) = payload?;
    let ticket = state.tickets.update_priority(&user, id, request.priority.as_deref()).await?;
    Ok(ApiResponse::success(ticket))
}

/// PATCH /tickets/:id/assign - `{ "assigneeId": 7 }` or `{ "assigneeId": null }`
pub async fn assign_patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AssignRequest>, JsonRejection>,
) -> ApiResult<TicketDetail> {
    let id = ticket_id(path)?;
    let Json(request) = payload?;
    let assignee_id = request
        .assignee_id
        .ok_or_else(|| ApiError::from(ServiceError::required("assigneeId")))?;

    let ticket = state.tickets.assign(&user, id, assignee_id).await?;
    Ok(ApiResponse::success(ticket))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_body_distinguishes_null_from_missing() {
        let null: AssignRequest = serde_json::from_str(r#"{"assigneeId": null}"#).unwrap();
        assert_eq!(null.assignee_id, Some(None));

        let set: AssignRequest = serde_json::from_str(r#"{"assigneeId": 7}"#).unwrap();
        assert_eq!(set.assignee_id, Some(Some(7)));

        let missing: AssignRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.assignee_id, None);
    }
}
