use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::models::{
    CommentView, NewComment, NewTicket, NewUser, PublicUser, StatusCounts, Ticket, TicketChange,
    TicketDetail, TicketSummary, User,
};
use super::store::{HelpdeskStore, StoreError, StoreResult, TicketScope};
use crate::types::{Role, TicketStatus};

/// Postgres error code for foreign key violations
const FOREIGN_KEY_VIOLATION: &str = "23503";

const USER_COLUMNS: &str = "id, email, name, role, password_hash, created_at, updated_at";
const TICKET_COLUMNS: &str =
    "id, title, description, status, priority, creator_id, assignee_id, created_at, updated_at";

#[derive(FromRow)]
struct UserRow {
    id: i64,
    email: String,
    name: Option<String>,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            role: parse_column(&row.role)?,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct TicketRow {
    id: i64,
    title: String,
    description: String,
    status: String,
    priority: String,
    creator_id: i64,
    assignee_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = StoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Ticket {
            id: row.id,
            title: row.title,
            description: row.description,
            status: parse_column(&row.status)?,
            priority: parse_column(&row.priority)?,
            creator_id: row.creator_id,
            assignee_id: row.assignee_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct SummaryRow {
    id: i64,
    title: String,
    status: String,
    priority: String,
    created_at: DateTime<Utc>,
}

/// Public user columns pulled out of a join
struct JoinedUser {
    id: i64,
    email: String,
    name: Option<String>,
    role: String,
}

impl TryFrom<JoinedUser> for PublicUser {
    type Error = StoreError;

    fn try_from(row: JoinedUser) -> Result<Self, Self::Error> {
        Ok(PublicUser {
            id: row.id,
            email: row.email,
            name: row.name,
            role: parse_column(&row.role)?,
        })
    }
}

#[derive(FromRow)]
struct CommentRow {
    id: i64,
    body: String,
    created_at: DateTime<Utc>,
    author_id: i64,
    author_email: String,
    author_name: Option<String>,
    author_role: String,
}

#[derive(FromRow)]
struct CountsRow {
    total: i64,
    open: i64,
    in_progress: i64,
    resolved: i64,
    closed: i64,
}

fn parse_column<T>(value: &str) -> StoreResult<T>
where
    T: std::str::FromStr<Err = crate::types::ParseEnumError>,
{
    value.parse().map_err(|e: crate::types::ParseEnumError| StoreError::Corrupt(e.to_string()))
}

/// Turn foreign key violations into `MissingReference`, pass everything else through
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            let entity = match db.constraint() {
                Some(name) if name.contains("ticket_id") => "ticket",
                _ => "user",
            };
            return StoreError::MissingReference(entity);
        }
    }
    StoreError::Sqlx(err)
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn comments_for(&self, ticket_id: i64) -> StoreResult<Vec<CommentView>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.body, c.created_at,
                   u.id AS author_id, u.email AS author_email,
                   u.name AS author_name, u.role AS author_role
            FROM ticket_comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.ticket_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(CommentView {
                    id: row.id,
                    body: row.body,
                    created_at: row.created_at,
                    author: PublicUser::try_from(JoinedUser {
                        id: row.author_id,
                        email: row.author_email,
                        name: row.author_name,
                        role: row.author_role,
                    })?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl HelpdeskStore for PgStore {
    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn users_with_role(&self, role: Role) -> StoreResult<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE role = $1 ORDER BY email ASC, id ASC",
            USER_COLUMNS
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn upsert_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (email, name, role, password_hash) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (email) DO NOTHING RETURNING {}",
            USER_COLUMNS
        );
        let inserted = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.email)
            .bind(&user.name)
            .bind(user.role.as_str())
            .bind(&user.password_hash)
            .fetch_optional(&self.pool)
            .await?;

        match inserted {
            Some(row) => User::try_from(row),
            None => self
                .user_by_email(&user.email)
                .await?
                .ok_or_else(|| StoreError::Corrupt(format!("user {} vanished during upsert", user.email))),
        }
    }

    async fn list_tickets(&self, scope: TicketScope) -> StoreResult<Vec<TicketSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT id, title, status, priority, created_at
            FROM tickets
            WHERE ($1::BIGINT IS NULL OR creator_id = $1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(scope.creator_id())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(TicketSummary {
                    id: row.id,
                    title: row.title,
                    status: parse_column(&row.status)?,
                    priority: parse_column(&row.priority)?,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    async fn ticket(&self, id: i64) -> StoreResult<Option<Ticket>> {
        let sql = format!("SELECT {} FROM tickets WHERE id = $1", TICKET_COLUMNS);
        sqlx::query_as::<_, TicketRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Ticket::try_from)
            .transpose()
    }

    async fn ticket_detail(&self, id: i64) -> StoreResult<Option<TicketDetail>> {
        let Some(ticket) = self.ticket(id).await? else {
            return Ok(None);
        };

        let creator = self
            .user_by_id(ticket.creator_id)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("ticket {} has no creator", id)))?;
        let assignee = match ticket.assignee_id {
            Some(assignee_id) => self.user_by_id(assignee_id).await?,
            None => None,
        };
        let comments = self.comments_for(id).await?;

        Ok(Some(TicketDetail {
            id: ticket.id,
            title: ticket.title,
            description: ticket.description,
            status: ticket.status,
            priority: ticket.priority,
            creator: creator.into(),
            assignee: assignee.map(PublicUser::from),
            comments,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }))
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> StoreResult<i64> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO tickets (title, description, status, priority, creator_id, assignee_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(TicketStatus::Open.as_str())
        .bind(ticket.priority.as_str())
        .bind(ticket.creator_id)
        .bind(ticket.assignee_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(id)
    }

    async fn update_ticket(&self, id: i64, change: TicketChange) -> StoreResult<bool> {
        let query = match change {
            TicketChange::Status(status) => {
                sqlx::query("UPDATE tickets SET status = $2, updated_at = now() WHERE id = $1")
                    .bind(id)
                    .bind(status.as_str())
            }
            TicketChange::Priority(priority) => {
                sqlx::query("UPDATE tickets SET priority = $2, updated_at = now() WHERE id = $1")
                    .bind(id)
                    .bind(priority.as_str())
            }
            TicketChange::Assignee(assignee_id) => {
                sqlx::query("UPDATE tickets SET assignee_id = $2, updated_at = now() WHERE id = $1")
                    .bind(id)
                    .bind(assignee_id)
            }
        };

        let result = query.execute(&self.pool).await.map_err(map_write_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<i64> {
        let mut tx = self.pool.begin().await?;

        let (id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO ticket_comments (ticket_id, author_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, created_at
            "#,
        )
        .bind(comment.ticket_id)
        .bind(comment.author_id)
        .bind(&comment.body)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        sqlx::query("UPDATE tickets SET updated_at = GREATEST(updated_at, $2) WHERE id = $1")
            .bind(comment.ticket_id)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(id)
    }

    async fn status_counts(&self, scope: TicketScope) -> StoreResult<StatusCounts> {
        // One statement, one snapshot: the five numbers always agree
        let row = sqlx::query_as::<_, CountsRow>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'OPEN') AS open,
                COUNT(*) FILTER (WHERE status = 'IN_PROGRESS') AS in_progress,
                COUNT(*) FILTER (WHERE status = 'RESOLVED') AS resolved,
                COUNT(*) FILTER (WHERE status = 'CLOSED') AS closed
            FROM tickets
            WHERE ($1::BIGINT IS NULL OR creator_id = $1)
            "#,
        )
        .bind(scope.creator_id())
        .fetch_one(&self.pool)
        .await?;

        Ok(StatusCounts {
            total: row.total,
            open: row.open,
            in_progress: row.in_progress,
            resolved: row.resolved,
            closed: row.closed,
        })
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
