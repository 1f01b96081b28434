// handlers/protected/tickets/mod.rs - ticket endpoints
//
// GET    /tickets                 list (scoped by role)
// GET    /tickets/summary         counts by status over the same scope
// POST   /tickets                 create
// GET    /tickets/:id             detail
// PATCH  /tickets/:id/status      lifecycle change
// PATCH  /tickets/:id/priority
// PATCH  /tickets/:id/assign      assign or unassign
// POST   /tickets/:id/comments    append a comment

pub mod comments;
pub mod create;
pub mod list;
pub mod show;
pub mod update;

pub use comments::comment_post;
pub use create::ticket_post;
pub use list::{summary_get, tickets_get};
pub use show::ticket_get;
pub use update::{assign_patch, priority_patch, status_patch};

use axum::extract::{rejection::PathRejection, Path};

use crate::error::ApiError;

/// Ticket id from the path; anything that is not an integer is a 400
pub(crate) fn ticket_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    let Path(id) = path?;
    Ok(id)
}
