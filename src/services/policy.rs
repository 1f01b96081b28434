//! Ticket access and lifecycle rules
//!
//! Pure functions over already-loaded data. Nothing here touches the store,
//! so every rule can be exercised without a database.

use crate::auth::AuthUser;
use crate::database::models::{Ticket, User};
use crate::database::TicketScope;
use crate::types::{Role, TicketPriority, TicketStatus};

use super::error::{ServiceError, ServiceResult};

pub const TITLE_MIN_LEN: usize = 3;
pub const DESCRIPTION_MIN_LEN: usize = 5;

/// Only agents can be assigned tickets
pub const ASSIGNABLE_ROLE: Role = Role::Agent;

/// Tickets a requester may enumerate
pub fn list_scope(user: &AuthUser) -> TicketScope {
    match user.role {
        Role::Employee => TicketScope::CreatedBy(user.id),
        Role::Agent | Role::Admin => TicketScope::All,
    }
}

pub fn can_view(user: &AuthUser, ticket: &Ticket) -> bool {
    list_scope(user).includes(ticket)
}

pub fn ensure_can_view(user: &AuthUser, ticket: &Ticket) -> ServiceResult<()> {
    if can_view(user, ticket) {
        Ok(())
    } else {
        Err(ServiceError::forbidden("You do not have access to this ticket"))
    }
}

/// Mutations follow the same visibility rule as reads
pub fn ensure_can_modify(user: &AuthUser, ticket: &Ticket) -> ServiceResult<()> {
    if can_view(user, ticket) {
        Ok(())
    } else {
        Err(ServiceError::forbidden("You cannot modify this ticket"))
    }
}

/// Lifecycle ordering: OPEN -> IN_PROGRESS -> RESOLVED -> CLOSED.
///
/// Admins may move a ticket anywhere. Re-applying the current status is
/// always allowed and changes nothing.
pub fn check_transition(role: Role, from: TicketStatus, to: TicketStatus) -> ServiceResult<()> {
    if from == to || role == Role::Admin || from.next() == Some(to) {
        return Ok(());
    }
    Err(ServiceError::validation(
        "status",
        format!("Cannot move a ticket from {} to {}", from, to),
    ))
}

pub fn ensure_assignable(user: &User) -> ServiceResult<()> {
    if user.role == ASSIGNABLE_ROLE {
        Ok(())
    } else {
        Err(ServiceError::validation(
            "assigneeId",
            format!("User {} is not an {} and cannot be assigned tickets", user.id, ASSIGNABLE_ROLE),
        ))
    }
}

fn require_min_len(field: &'static str, value: Option<&str>, min: usize) -> ServiceResult<String> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(ServiceError::required(field));
    }
    if value.chars().count() < min {
        return Err(ServiceError::validation(
            field,
            format!("{} must be at least {} characters", field, min),
        ));
    }
    Ok(value.to_string())
}

pub fn validate_title(title: Option<&str>) -> ServiceResult<String> {
    require_min_len("title", title, TITLE_MIN_LEN)
}

pub fn validate_description(description: Option<&str>) -> ServiceResult<String> {
    require_min_len("description", description, DESCRIPTION_MIN_LEN)
}

pub fn validate_comment_body(body: Option<&str>) -> ServiceResult<String> {
    require_min_len("body", body, 1)
}

pub fn parse_status(status: Option<&str>) -> ServiceResult<TicketStatus> {
    status
        .ok_or_else(|| ServiceError::required("status"))?
        .parse()
        .map_err(|e: crate::types::ParseEnumError| ServiceError::validation("status", e.to_string()))
}

/// A missing priority means the default (MEDIUM); a present one must be valid
pub fn parse_priority_or_default(priority: Option<&str>) -> ServiceResult<TicketPriority> {
    match priority {
        None => Ok(TicketPriority::default()),
        Some(raw) => parse_priority(Some(raw)),
    }
}

pub fn parse_priority(priority: Option<&str>) -> ServiceResult<TicketPriority> {
    priority
        .ok_or_else(|| ServiceError::required("priority"))?
        .parse()
        .map_err(|e: crate::types::ParseEnumError| ServiceError::validation("priority", e.to_string()))
}
