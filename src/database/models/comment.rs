use chrono::{DateTime, Utc};
use serde::Serialize;

use super::user::PublicUser;

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub ticket_id: i64,
    pub author_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Comment as embedded in a ticket detail, author resolved
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub author: PublicUser,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub ticket_id: i64,
    pub author_id: i64,
    pub body: String,
}
