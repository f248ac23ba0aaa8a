use serde::Serialize;

use crate::database::models::{Node, User};
use crate::locale::RequestLocale;

/// Wire format of a node: localized title and timestamps, nested children
#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    pub id: i64,
    pub content: String,
    pub title: String,
    pub parent: Option<i64>,
    pub children: Vec<NodeView>,
    pub created_at: String,
    pub created_by: Option<i64>,
    pub updated_at: String,
    pub updated_by: Option<i64>,
    pub is_deleted: bool,
}

impl NodeView {
    pub fn from_node(node: &Node, children: Vec<NodeView>, locale: &RequestLocale) -> Self {
        Self {
            id: node.id,
            content: node.content.clone(),
            title: locale.title(node.id),
            parent: node.parent_id,
            children,
            created_at: locale.format_timestamp(&node.created_at),
            created_by: node.created_by,
            updated_at: locale.format_timestamp(&node.updated_at),
            updated_by: node.updated_by,
            is_deleted: node.is_deleted,
        }
    }

    /// Without any children
    pub fn flat(node: &Node, locale: &RequestLocale) -> Self {
        Self::from_node(node, Vec::new(), locale)
    }
}

/// Single-user view with audit extras
#[derive(Debug, Serialize)]
pub struct UserDetailView {
    #[serde(flatten)]
    pub user: User,
    pub nodes_created_count: i64,
    pub role_display: &'static str,
}

impl UserDetailView {
    pub fn new(user: User, nodes_created_count: i64) -> Self {
        let role_display = user.role.display_name();
        Self {
            user,
            nodes_created_count,
            role_display,
        }
    }
}

/// Response for a soft-deleted node
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: String,
    pub id: i64,
}

impl Deleted {
    pub fn node(id: i64) -> Self {
        Self {
            message: format!("Node {} deleted successfully.", id),
            id,
        }
    }
}

/// Plain confirmation body
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

impl Message {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Role;
    use crate::locale::Language;
    use chrono::{TimeZone, Utc};

    #[test]
    fn node_view_is_localized() {
        let created = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let node = Node {
            id: 3,
            parent_id: Some(1),
            content: "Grandchild".into(),
            is_deleted: false,
            deleted_at: None,
            created_at: created,
            updated_at: created,
            created_by: Some(9),
            updated_by: None,
        };
        let locale = RequestLocale { language: Language::Es, timezone: "America/New_York".into() };

        let json = serde_json::to_value(NodeView::flat(&node, &locale)).unwrap();
        assert_eq!(json["title"], "tres");
        assert_eq!(json["parent"], 1);
        assert_eq!(json["created_at"], "2024-01-15 05:00:00");
        assert_eq!(json["children"], serde_json::json!([]));
    }

    #[test]
    fn user_detail_hides_hash() {
        let user = User {
            id: 1,
            username: "root".into(),
            email: "root@example.com".into(),
            password_hash: "$2b$secret".into(),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::Sudo,
            is_email_confirmed: true,
            is_active: true,
            is_deleted: false,
            deleted_at: None,
            date_joined: Utc::now(),
            last_login: None,
        };
        let json = serde_json::to_value(UserDetailView::new(user, 4)).unwrap();
        assert_eq!(json["role"], "SUDO");
        assert_eq!(json["role_display"], "Super User Ops");
        assert_eq!(json["nodes_created_count"], 4);
        assert!(json.get("password_hash").is_none());
    }
}
