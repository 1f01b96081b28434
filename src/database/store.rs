use async_trait::async_trait;
use thiserror::Error;

use super::models::{
    NewComment, NewTicket, NewUser, StatusCounts, Ticket, TicketChange, TicketDetail,
    TicketSummary, User,
};
use crate::types::Role;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A foreign key pointed at a row that does not exist
    #[error("Referenced {0} does not exist")]
    MissingReference(&'static str),

    /// A persisted value could not be mapped back into the domain
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Row filter shared by ticket listing and status counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketScope {
    All,
    CreatedBy(i64),
}

impl TicketScope {
    /// Creator filter as a nullable SQL parameter
    pub fn creator_id(&self) -> Option<i64> {
        match self {
            TicketScope::All => None,
            TicketScope::CreatedBy(user_id) => Some(*user_id),
        }
    }

    pub fn includes(&self, ticket: &Ticket) -> bool {
        match self {
            TicketScope::All => true,
            TicketScope::CreatedBy(user_id) => ticket.creator_id == *user_id,
        }
    }
}

/// Relational store behind the helpdesk services
///
/// Every write touches a single row by primary key except `insert_comment`,
/// which also bumps the parent ticket's `updated_at` atomically.
#[async_trait]
pub trait HelpdeskStore: Send + Sync {
    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    /// Exact, case-sensitive match
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Ordered by email ascending, then id
    async fn users_with_role(&self, role: Role) -> StoreResult<Vec<User>>;

    /// Inserts the account unless the email is taken; either way returns the stored row
    async fn upsert_user(&self, user: NewUser) -> StoreResult<User>;

    /// Ordered by creation time descending, then id descending
    async fn list_tickets(&self, scope: TicketScope) -> StoreResult<Vec<TicketSummary>>;

    async fn ticket(&self, id: i64) -> StoreResult<Option<Ticket>>;

    /// Comments ordered by creation time ascending
    async fn ticket_detail(&self, id: i64) -> StoreResult<Option<TicketDetail>>;

    async fn insert_ticket(&self, ticket: NewTicket) -> StoreResult<i64>;

    /// Returns false when no ticket has this id
    async fn update_ticket(&self, id: i64, change: TicketChange) -> StoreResult<bool>;

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<i64>;

    /// All five numbers come from one consistent snapshot
    async fn status_counts(&self, scope: TicketScope) -> StoreResult<StatusCounts>;

    async fn health_check(&self) -> StoreResult<()>;
}
