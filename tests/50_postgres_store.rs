//! Store contract against a live PostgreSQL.
//!
//! Runs only when `DATABASE_URL` is set (a `.env` file works too). Every test
//! creates its own users, so a shared database with existing rows is fine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use helpdesk_api::config::AppConfig;
use helpdesk_api::database::models::{NewComment, NewTicket, NewUser, TicketChange, User};
use helpdesk_api::database::{DatabaseManager, HelpdeskStore, StoreError, TicketScope};
use helpdesk_api::types::{Role, TicketPriority, TicketStatus};

static NEXT_EMAIL: AtomicU64 = AtomicU64::new(0);

async fn pg_store() -> Result<Option<Arc<dyn HelpdeskStore>>> {
    dotenvy::dotenv().ok();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping PostgreSQL store test");
        return Ok(None);
    };

    let config = AppConfig::development();
    let manager = DatabaseManager::connect(&url, &config.database).await?;
    manager.migrate().await?;
    Ok(Some(manager.store()))
}

async fn user(store: &Arc<dyn HelpdeskStore>, role: Role) -> Result<User> {
    let n = NEXT_EMAIL.fetch_add(1, Ordering::SeqCst);
    let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let stored = store
        .upsert_user(NewUser {
            email: format!("{}-{}-{}@pg.example.com", role, stamp, n),
            name: None,
            role,
            password_hash: "x".to_string(),
        })
        .await?;
    Ok(stored)
}

fn new_ticket(title: &str, creator_id: i64, assignee_id: Option<i64>) -> NewTicket {
    NewTicket {
        title: title.to_string(),
        description: "Something is broken".to_string(),
        priority: TicketPriority::High,
        creator_id,
        assignee_id,
    }
}

#[tokio::test]
async fn upsert_keeps_existing_account() -> Result<()> {
    let Some(store) = pg_store().await? else { return Ok(()) };
    let employee = user(&store, Role::Employee).await?;

    let again = store
        .upsert_user(NewUser {
            email: employee.email.clone(),
            name: Some("Other".to_string()),
            role: Role::Admin,
            password_hash: "y".to_string(),
        })
        .await?;
    assert_eq!(again.id, employee.id);
    assert_eq!(again.role, Role::Employee);
    assert_eq!(again.password_hash, "x");
    Ok(())
}

#[tokio::test]
async fn listing_is_scoped_and_newest_first() -> Result<()> {
    let Some(store) = pg_store().await? else { return Ok(()) };
    let employee = user(&store, Role::Employee).await?;
    let other = user(&store, Role::Employee).await?;

    let first = store.insert_ticket(new_ticket("first", employee.id, None)).await?;
    let second = store.insert_ticket(new_ticket("second", employee.id, None)).await?;
    let foreign = store.insert_ticket(new_ticket("foreign", other.id, None)).await?;

    let own = store.list_tickets(TicketScope::CreatedBy(employee.id)).await?;
    let ids: Vec<i64> = own.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![second, first]);
    assert_eq!(own[0].priority, TicketPriority::High);
    assert_eq!(own[0].status, TicketStatus::Open);

    let all: Vec<i64> = store.list_tickets(TicketScope::All).await?.iter().map(|t| t.id).collect();
    assert!(all.contains(&first) && all.contains(&foreign));
    Ok(())
}

#[tokio::test]
async fn counts_follow_scope_and_add_up() -> Result<()> {
    let Some(store) = pg_store().await? else { return Ok(()) };
    let employee = user(&store, Role::Employee).await?;

    let a = store.insert_ticket(new_ticket("a", employee.id, None)).await?;
    let b = store.insert_ticket(new_ticket("b", employee.id, None)).await?;
    store.insert_ticket(new_ticket("c", employee.id, None)).await?;
    store.update_ticket(a, TicketChange::Status(TicketStatus::InProgress)).await?;
    store.update_ticket(b, TicketChange::Status(TicketStatus::Closed)).await?;

    let own = store.status_counts(TicketScope::CreatedBy(employee.id)).await?;
    assert_eq!((own.total, own.open, own.in_progress, own.resolved, own.closed), (3, 1, 1, 0, 1));

    let all = store.status_counts(TicketScope::All).await?;
    assert_eq!(all.total, all.open + all.in_progress + all.resolved + all.closed);
    assert!(all.total >= own.total);
    Ok(())
}

#[tokio::test]
async fn unknown_references_are_missing_references() -> Result<()> {
    let Some(store) = pg_store().await? else { return Ok(()) };
    let employee = user(&store, Role::Employee).await?;
    let missing = i64::MAX;

    let err = store
        .insert_ticket(new_ticket("printer", employee.id, Some(missing)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::MissingReference("user")), "{:?}", err);

    let id = store.insert_ticket(new_ticket("printer", employee.id, None)).await?;
    let err = store
        .update_ticket(id, TicketChange::Assignee(Some(missing)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::MissingReference("user")), "{:?}", err);

    let err = store
        .insert_comment(NewComment {
            ticket_id: missing,
            author_id: employee.id,
            body: "Hello".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::MissingReference("ticket")), "{:?}", err);

    assert!(!store.update_ticket(missing, TicketChange::Assignee(None)).await?);
    Ok(())
}

#[tokio::test]
async fn comments_bump_updated_at() -> Result<()> {
    let Some(store) = pg_store().await? else { return Ok(()) };
    let employee = user(&store, Role::Employee).await?;
    let agent = user(&store, Role::Agent).await?;

    let id = store.insert_ticket(new_ticket("printer", employee.id, Some(agent.id))).await?;
    let before = store.ticket(id).await?.map(|t| t.updated_at);

    for body in ["Checked cable", "Replaced toner"] {
        store
            .insert_comment(NewComment {
                ticket_id: id,
                author_id: agent.id,
                body: body.to_string(),
            })
            .await?;
    }

    let detail = store.ticket_detail(id).await?.expect("ticket exists");
    assert_eq!(detail.assignee.map(|a| a.id), Some(agent.id));
    assert_eq!(detail.creator.id, employee.id);

    let bodies: Vec<&str> = detail.comments.iter().map(|c| c.body.as_str()).collect();
    assert_eq!(bodies, vec!["Checked cable", "Replaced toner"]);
    assert_eq!(detail.comments[1].author.id, agent.id);
    assert!(Some(detail.comments[0].created_at) >= before);
    assert_eq!(detail.updated_at, detail.comments[1].created_at);
    Ok(())
}
