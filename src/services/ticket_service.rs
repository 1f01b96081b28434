use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::error::{ServiceError, ServiceResult};
use super::policy;
use crate::auth::AuthUser;
use crate::database::models::{
    NewComment, NewTicket, StatusCounts, Ticket, TicketChange, TicketDetail, TicketSummary,
};
use crate::database::HelpdeskStore;

/// Body of `POST /tickets`
///
/// Fields stay loosely typed so validation can name the offending field.
/// There is no status or creator: both are decided server-side.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub assignee_id: Option<i64>,
}

#[derive(Clone)]
pub struct TicketService {
    store: Arc<dyn HelpdeskStore>,
}

impl TicketService {
    pub fn new(store: Arc<dyn HelpdeskStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, user: &AuthUser) -> ServiceResult<Vec<TicketSummary>> {
        Ok(self.store.list_tickets(policy::list_scope(user)).await?)
    }

    /// Counts over the same scope as `list`
    pub async fn summary(&self, user: &AuthUser) -> ServiceResult<StatusCounts> {
        Ok(self.store.status_counts(policy::list_scope(user)).await?)
    }

    pub async fn get(&self, user: &AuthUser, id: i64) -> ServiceResult<TicketDetail> {
        let ticket = self.load(id).await?;
        policy::ensure_can_view(user, &ticket)?;
        self.detail(id).await
    }

    pub async fn create(&self, user: &AuthUser, request: CreateTicketRequest) -> ServiceResult<TicketDetail> {
        let title = policy::validate_title(request.title.as_deref())?;
        let description = policy::validate_description(request.description.as_deref())?;
        let priority = policy::parse_priority_or_default(request.priority.as_deref())?;

        if let Some(assignee_id) = request.assignee_id {
            self.resolve_assignee(assignee_id).await?;
        }

        let id = self
            .store
            .insert_ticket(NewTicket {
                title,
                description,
                priority,
                creator_id: user.id,
                assignee_id: request.assignee_id,
            })
            .await?;

        info!("Ticket {} created by user {}", id, user.id);
        self.detail(id).await
    }

    pub async fn update_status(&self, user: &AuthUser, id: i64, status: Option<&str>) -> ServiceResult<TicketDetail> {
        let ticket = self.load(id).await?;
        policy::ensure_can_modify(user, &ticket)?;
        let status = policy::parse_status(status)?;
        policy::check_transition(user.role, ticket.status, status)?;

        self.apply(id, TicketChange::Status(status)).await?;
        info!("Ticket {} status {} -> {} by user {}", id, ticket.status, status, user.id);
        self.detail(id).await
    }

    pub async fn update_priority(&self, user: &AuthUser, id: i64, priority: Option<&str>) -> ServiceResult<TicketDetail> {
        let ticket = self.load(id).await?;
        policy::ensure_can_modify(user, &ticket)?;
        let priority = policy::parse_priority(priority)?;

        self.apply(id, TicketChange::Priority(priority)).await?;
        info!("Ticket {} priority set to {} by user {}", id, priority, user.id);
        self.detail(id).await
    }

    /// `None` unassigns
    pub async fn assign(&self, user: &AuthUser, id: i64, assignee_id: Option<i64>) -> ServiceResult<TicketDetail> {
        let ticket = self.load(id).await?;
        policy::ensure_can_modify(user, &ticket)?;
        if let Some(assignee_id) = assignee_id {
            self.resolve_assignee(assignee_id).await?;
        }

        self.apply(id, TicketChange::Assignee(assignee_id)).await?;
        match assignee_id {
            Some(assignee_id) => info!("Ticket {} assigned to user {} by user {}", id, assignee_id, user.id),
            None => info!("Ticket {} unassigned by user {}", id, user.id),
        }
        self.detail(id).await
    }

    pub async fn add_comment(&self, user: &AuthUser, id: i64, body: Option<&str>) -> ServiceResult<TicketDetail> {
        let ticket = self.load(id).await?;
        policy::ensure_can_modify(user, &ticket)?;
        let body = policy::validate_comment_body(body)?;

        self.store
            .insert_comment(NewComment {
                ticket_id: id,
                author_id: user.id,
                body,
            })
            .await?;
        self.detail(id).await
    }

    async fn load(&self, id: i64) -> ServiceResult<Ticket> {
        self.store
            .ticket(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Ticket not found"))
    }

    async fn detail(&self, id: i64) -> ServiceResult<TicketDetail> {
        self.store
            .ticket_detail(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Ticket not found"))
    }

    async fn apply(&self, id: i64, change: TicketChange) -> ServiceResult<()> {
        if self.store.update_ticket(id, change).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found("Ticket not found"))
        }
    }

    async fn resolve_assignee(&self, assignee_id: i64) -> ServiceResult<()> {
        let assignee = self
            .store
            .user_by_id(assignee_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Assignee not found"))?;
        policy::ensure_assignable(&assignee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;
    use crate::types::{Role, TicketPriority, TicketStatus};

    fn printer_ticket() -> CreateTicketRequest {
        CreateTicketRequest {
            title: Some("Printer broken".to_string()),
            description: Some("Won't turn on".to_string()),
            priority: Some("HIGH".to_string()),
            assignee_id: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let ctx = TestContext::new().await;
        let employee = ctx.requester(Role::Employee).await;

        let created = ctx.tickets.create(&employee, printer_ticket()).await.unwrap();
        let fetched = ctx.tickets.get(&employee, created.id).await.unwrap();

        assert_eq!(fetched.title, "Printer broken");
        assert_eq!(fetched.description, "Won't turn on");
        assert_eq!(fetched.priority, TicketPriority::High);
        assert_eq!(fetched.status, TicketStatus::Open);
        assert_eq!(fetched.creator.id, employee.id);
        assert!(fetched.assignee.is_none());
        assert!(fetched.comments.is_empty());
    }

    #[tokio::test]
    async fn priority_defaults_to_medium() {
        let ctx = TestContext::new().await;
        let employee = ctx.requester(Role::Employee).await;
        let request = CreateTicketRequest {
            priority: None,
            ..printer_ticket()
        };

        let created = ctx.tickets.create(&employee, request).await.unwrap();
        assert_eq!(created.priority, TicketPriority::Medium);
    }

    #[tokio::test]
    async fn create_rejects_unknown_assignee_without_writing() {
        let ctx = TestContext::new().await;
        let employee = ctx.requester(Role::Employee).await;
        let request = CreateTicketRequest {
            assignee_id: Some(999),
            ..printer_ticket()
        };

        let err = ctx.tickets.create(&employee, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(ctx.tickets.list(&employee).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn employees_only_see_their_own() {
        let ctx = TestContext::new().await;
        let alice = ctx.requester(Role::Employee).await;
        let bob = ctx.requester(Role::Employee).await;
        let agent = ctx.requester(Role::Agent).await;

        let mine = ctx.tickets.create(&alice, printer_ticket()).await.unwrap();
        ctx.tickets.create(&bob, printer_ticket()).await.unwrap();

        let listed = ctx.tickets.list(&alice).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine.id);

        assert_eq!(ctx.tickets.list(&agent).await.unwrap().len(), 2);
        assert!(matches!(
            ctx.tickets.get(&bob, mine.id).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            ctx.tickets.get(&agent, 4242).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_status_leaves_ticket_unchanged() {
        let ctx = TestContext::new().await;
        let employee = ctx.requester(Role::Employee).await;
        let agent = ctx.requester(Role::Agent).await;
        let ticket = ctx.tickets.create(&employee, printer_ticket()).await.unwrap();

        let err = ctx.tickets.update_status(&agent, ticket.id, Some("DONE")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { field: "status", .. }));

        let after = ctx.tickets.get(&agent, ticket.id).await.unwrap();
        assert_eq!(after.status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn status_follows_lifecycle_for_agents() {
        let ctx = TestContext::new().await;
        let employee = ctx.requester(Role::Employee).await;
        let agent = ctx.requester(Role::Agent).await;
        let admin = ctx.requester(Role::Admin).await;
        let ticket = ctx.tickets.create(&employee, printer_ticket()).await.unwrap();

        let moved = ctx.tickets.update_status(&agent, ticket.id, Some("IN_PROGRESS")).await.unwrap();
        assert_eq!(moved.status, TicketStatus::InProgress);

        assert!(ctx.tickets.update_status(&agent, ticket.id, Some("OPEN")).await.is_err());

        let reopened = ctx.tickets.update_status(&admin, ticket.id, Some("OPEN")).await.unwrap();
        assert_eq!(reopened.status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn other_employees_cannot_mutate() {
        let ctx = TestContext::new().await;
        let owner = ctx.requester(Role::Employee).await;
        let other = ctx.requester(Role::Employee).await;
        let ticket = ctx.tickets.create(&owner, printer_ticket()).await.unwrap();

        assert!(matches!(
            ctx.tickets.update_priority(&other, ticket.id, Some("LOW")).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            ctx.tickets.add_comment(&other, ticket.id, Some("me too")).await,
            Err(ServiceError::Forbidden(_))
        ));
        let updated = ctx.tickets.update_priority(&owner, ticket.id, Some("LOW")).await.unwrap();
        assert_eq!(updated.priority, TicketPriority::Low);
    }

    #[tokio::test]
    async fn assign_then_unassign() {
        let ctx = TestContext::new().await;
        let employee = ctx.requester(Role::Employee).await;
        let agent = ctx.requester(Role::Agent).await;
        let ticket = ctx.tickets.create(&employee, printer_ticket()).await.unwrap();

        let assigned = ctx.tickets.assign(&agent, ticket.id, Some(agent.id)).await.unwrap();
        assert_eq!(assigned.assignee.map(|a| a.id), Some(agent.id));

        ctx.tickets.assign(&agent, ticket.id, None).await.unwrap();
        let after = ctx.tickets.get(&agent, ticket.id).await.unwrap();
        assert!(after.assignee.is_none());
    }

    #[tokio::test]
    async fn assigning_a_non_agent_is_rejected() {
        let ctx = TestContext::new().await;
        let employee = ctx.requester(Role::Employee).await;
        let admin = ctx.requester(Role::Admin).await;
        let ticket = ctx.tickets.create(&employee, printer_ticket()).await.unwrap();

        let err = ctx.tickets.assign(&admin, ticket.id, Some(employee.id)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { field: "assigneeId", .. }));
        let err = ctx.tickets.assign(&admin, ticket.id, Some(777)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn comments_append_exactly_one() {
        let ctx = TestContext::new().await;
        let employee = ctx.requester(Role::Employee).await;
        let ticket = ctx.tickets.create(&employee, printer_ticket()).await.unwrap();

        let updated = ctx.tickets.add_comment(&employee, ticket.id, Some("Checked cable")).await.unwrap();
        assert_eq!(updated.comments.len(), ticket.comments.len() + 1);

        let comment = &updated.comments[0];
        assert_eq!(comment.body, "Checked cable");
        assert_eq!(comment.author.id, employee.id);
        assert!(comment.created_at >= ticket.updated_at);

        assert!(matches!(
            ctx.tickets.add_comment(&employee, ticket.id, Some("")).await,
            Err(ServiceError::Validation { field: "body", .. })
        ));
        assert!(matches!(
            ctx.tickets.add_comment(&employee, 999, Some("hello")).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn summary_counts_add_up() {
        let ctx = TestContext::new().await;
        let employee = ctx.requester(Role::Employee).await;
        let admin = ctx.requester(Role::Admin).await;

        let a = ctx.tickets.create(&employee, printer_ticket()).await.unwrap();
        ctx.tickets.create(&employee, printer_ticket()).await.unwrap();
        ctx.tickets.create(&admin, printer_ticket()).await.unwrap();
        ctx.tickets.update_status(&admin, a.id, Some("RESOLVED")).await.unwrap();

        let own = ctx.tickets.summary(&employee).await.unwrap();
        assert_eq!(own.total, 2);
        assert_eq!(own.resolved, 1);
        assert!(own.is_consistent());

        let all = ctx.tickets.summary(&admin).await.unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.open, 2);
        assert!(all.is_consistent());
    }
}
