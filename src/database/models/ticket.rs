use chrono::{DateTime, Utc};
use serde::Serialize;

use super::comment::CommentView;
use super::user::PublicUser;
use crate::types::{TicketPriority, TicketStatus};

#[derive(Debug, Clone)]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub creator_id: i64,
    pub assignee_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape returned by `GET /tickets`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    pub id: i64,
    pub title: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_at: DateTime<Utc>,
}

impl From<&Ticket> for TicketSummary {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id,
            title: ticket.title.clone(),
            status: ticket.status,
            priority: ticket.priority,
            created_at: ticket.created_at,
        }
    }
}

/// Ticket with its full relation graph
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub creator: PublicUser,
    pub assignee: Option<PublicUser>,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload. There is no status field: new tickets always start OPEN.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub creator_id: i64,
    pub assignee_id: Option<i64>,
}

/// A single-column partial update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketChange {
    Status(TicketStatus),
    Priority(TicketPriority),
    /// `None` clears the assignee
    Assignee(Option<i64>),
}

/// Per-status ticket counts over one scope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: i64,
    pub open: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub closed: i64,
}

impl StatusCounts {
    pub fn tally<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = TicketStatus>,
    {
        statuses.into_iter().fold(Self::default(), |mut counts, status| {
            counts.total += 1;
            match status {
                TicketStatus::Open => counts.open += 1,
                TicketStatus::InProgress => counts.in_progress += 1,
                TicketStatus::Resolved => counts.resolved += 1,
                TicketStatus::Closed => counts.closed += 1,
            }
            counts
        })
    }

    /// Every ticket is in exactly one status
    pub fn is_consistent(&self) -> bool {
        self.open + self.in_progress + self.resolved + self.closed == self.total
    }
}
