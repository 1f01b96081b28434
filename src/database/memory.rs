//! In-process store used for development runs without PostgreSQL and for tests.
//!
//! All state sits behind one `RwLock`, so every read observes a single
//! consistent snapshot.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::models::{
    Comment, CommentView, NewComment, NewTicket, NewUser, PublicUser, StatusCounts, Ticket,
    TicketChange, TicketDetail, TicketSummary, User,
};
use super::store::{HelpdeskStore, StoreError, StoreResult, TicketScope};
use crate::types::{Role, TicketStatus};

#[derive(Default)]
struct State {
    users: BTreeMap<i64, User>,
    tickets: BTreeMap<i64, Ticket>,
    comments: Vec<Comment>,
    next_user_id: i64,
    next_ticket_id: i64,
    next_comment_id: i64,
}

impl State {
    fn public_user(&self, id: i64) -> StoreResult<PublicUser> {
        self.users
            .get(&id)
            .map(PublicUser::from)
            .ok_or_else(|| StoreError::Corrupt(format!("user {} referenced but missing", id)))
    }

    fn require_user(&self, id: i64) -> StoreResult<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::MissingReference("user"))
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HelpdeskStore for MemoryStore {
    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn users_with_role(&self, role: Role) -> StoreResult<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().filter(|u| u.role == role).cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn upsert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.users.values().find(|u| u.email == user.email) {
            return Ok(existing.clone());
        }

        state.next_user_id += 1;
        let now = Utc::now();
        let stored = User {
            id: state.next_user_id,
            email: user.email,
            name: user.name,
            role: user.role,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_tickets(&self, scope: TicketScope) -> StoreResult<Vec<TicketSummary>> {
        let state = self.state.read().await;
        let mut tickets: Vec<&Ticket> = state.tickets.values().filter(|t| scope.includes(t)).collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tickets.into_iter().map(TicketSummary::from).collect())
    }

    async fn ticket(&self, id: i64) -> StoreResult<Option<Ticket>> {
        Ok(self.state.read().await.tickets.get(&id).cloned())
    }

    async fn ticket_detail(&self, id: i64) -> StoreResult<Option<TicketDetail>> {
        let state = self.state.read().await;
        let Some(ticket) = state.tickets.get(&id) else {
            return Ok(None);
        };

        let mut comments: Vec<&Comment> = state.comments.iter().filter(|c| c.ticket_id == id).collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        let comments = comments
            .into_iter()
            .map(|c| {
                Ok(CommentView {
                    id: c.id,
                    body: c.body.clone(),
                    created_at: c.created_at,
                    author: state.public_user(c.author_id)?,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Some(TicketDetail {
            id: ticket.id,
            title: ticket.title.clone(),
            description: ticket.description.clone(),
            status: ticket.status,
            priority: ticket.priority,
            creator: state.public_user(ticket.creator_id)?,
            assignee: ticket.assignee_id.map(|a| state.public_user(a)).transpose()?,
            comments,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }))
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> StoreResult<i64> {
        let mut state = self.state.write().await;
        state.require_user(ticket.creator_id)?;
        if let Some(assignee_id) = ticket.assignee_id {
            state.require_user(assignee_id)?;
        }

        state.next_ticket_id += 1;
        let now = Utc::now();
        let stored = Ticket {
            id: state.next_ticket_id,
            title: ticket.title,
            description: ticket.description,
            status: TicketStatus::Open,
            priority: ticket.priority,
            creator_id: ticket.creator_id,
            assignee_id: ticket.assignee_id,
            created_at: now,
            updated_at: now,
        };
        let id = stored.id;
        state.tickets.insert(id, stored);
        Ok(id)
    }

    async fn update_ticket(&self, id: i64, change: TicketChange) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if let TicketChange::Assignee(Some(assignee_id)) = change {
            state.require_user(assignee_id)?;
        }

        let Some(ticket) = state.tickets.get_mut(&id) else {
            return Ok(false);
        };
        match change {
            TicketChange::Status(status) => ticket.status = status,
            TicketChange::Priority(priority) => ticket.priority = priority,
            TicketChange::Assignee(assignee_id) => ticket.assignee_id = assignee_id,
        }
        ticket.updated_at = Utc::now().max(ticket.updated_at);
        Ok(true)
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<i64> {
        let mut state = self.state.write().await;
        state.require_user(comment.author_id)?;

        state.next_comment_id += 1;
        let id = state.next_comment_id;
        let ticket = state
            .tickets
            .get_mut(&comment.ticket_id)
            .ok_or(StoreError::MissingReference("ticket"))?;

        // Never earlier than the ticket's last change, even if the clock stepped back
        let created_at = Utc::now().max(ticket.updated_at);
        ticket.updated_at = created_at;

        state.comments.push(Comment {
            id,
            ticket_id: comment.ticket_id,
            author_id: comment.author_id,
            body: comment.body,
            created_at,
        });
        Ok(id)
    }

    async fn status_counts(&self, scope: TicketScope) -> StoreResult<StatusCounts> {
        let state = self.state.read().await;
        Ok(StatusCounts::tally(
            state.tickets.values().filter(|t| scope.includes(t)).map(|t| t.status),
        ))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
