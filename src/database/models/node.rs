use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Node {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub content: String,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.id, self.content)
    }
}

/// Node row annotated with its distance from the subtree root
#[derive(Debug, Clone, FromRow)]
pub struct NodeAtLevel {
    #[sqlx(flatten)]
    pub node: Node,
    pub level: i32,
}
