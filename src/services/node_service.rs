use serde::{Deserialize, Deserializer};
use serde_json::Value;
use sqlx::PgPool;

use crate::api::{check_body_id, NodeView, TreeBuilder};
use crate::audit;
use crate::database::models::{Node, User};
use crate::database::nodes::ACTIVE_CONTENT_INDEX;
use crate::database::{DatabaseError, DatabaseManager, NodeRepository};
use crate::error::ApiError;
use crate::locale::RequestLocale;
use crate::middleware::response::Page;

pub const MAX_CONTENT_LENGTH: usize = 255;

/// Body of node create/update requests
#[derive(Debug, Default, Deserialize)]
pub struct NodePayload {
    pub content: Option<String>,
    /// Outer None: field absent. Some(None): explicit null, i.e. make root.
    #[serde(default, deserialize_with = "present")]
    pub parent: Option<Option<i64>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl NodePayload {
    /// Decode a raw JSON body, rejecting malformed `id` values first
    pub fn from_json(body: Value) -> Result<Self, ApiError> {
        check_body_id(&body)?;
        if !body.is_object() {
            return Err(ApiError::invalid_json("Request body must be a JSON object"));
        }
        serde_json::from_value(body).map_err(|e| ApiError::validation_error(format!("Invalid node data: {}", e), None))
    }
}

/// Trimmed, non-empty, at most 255 characters
pub fn clean_content(raw: &str) -> Result<String, ApiError> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(ApiError::field("content", "This field may not be blank."));
    }
    if content.chars().count() > MAX_CONTENT_LENGTH {
        return Err(ApiError::field(
            "content",
            format!("Ensure this field has no more than {} characters.", MAX_CONTENT_LENGTH),
        ));
    }
    Ok(content.to_string())
}

fn duplicate_content(content: &str) -> ApiError {
    ApiError::field(
        "content",
        format!("An active node with content '{}' already exists at this level.", content),
    )
}

fn invalid_parent(parent_id: i64) -> ApiError {
    ApiError::field("parent", format!("Invalid pk \"{}\" - object does not exist.", parent_id))
}

pub struct NodeService {
    nodes: NodeRepository,
}

impl NodeService {
    pub async fn new() -> Result<Self, ApiError> {
        let pool = DatabaseManager::main_pool().await?;
        Ok(Self::with_pool(pool))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            nodes: NodeRepository::new(pool),
        }
    }

    /// Active nodes under `parent` (roots when None) with `levels` of children each
    pub async fn list(
        &self,
        parent: Option<i64>,
        limit: i64,
        offset: i64,
        levels: u32,
        locale: &RequestLocale,
    ) -> Result<Page<NodeView>, ApiError> {
        if let Some(parent_id) = parent {
            self.nodes.find_active_404(parent_id).await?;
        }

        let nodes = self.nodes.list_active(parent, limit, offset).await?;
        let count = self.nodes.count_active(parent).await?;
        let results = self.render(&nodes, levels, locale).await?;
        Ok(Page::new(results, count, limit, offset))
    }

    pub async fn get(&self, id: i64, levels: u32, locale: &RequestLocale) -> Result<NodeView, ApiError> {
        let node = self.nodes.find_active_404(id).await?;
        let descendants = self.nodes.descendants(&[id], levels).await?;
        Ok(TreeBuilder::new(descendants, locale).build(&node, levels))
    }

    /// Active nodes a user created, each with its direct children
    pub async fn created_by(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
        locale: &RequestLocale,
    ) -> Result<Page<NodeView>, ApiError> {
        let nodes = self.nodes.list_by_creator(user_id, limit, offset).await?;
        let count = self.nodes.count_by_creator(user_id).await?;
        let results = self.render(&nodes, 1, locale).await?;
        Ok(Page::new(results, count, limit, offset))
    }

    pub async fn count_created_by(&self, user_id: i64) -> Result<i64, ApiError> {
        Ok(self.nodes.count_by_creator(user_id).await?)
    }

    async fn render(&self, nodes: &[Node], levels: u32, locale: &RequestLocale) -> Result<Vec<NodeView>, ApiError> {
        let ids: Vec<i64> = nodes.iter().map(|n| n.id).collect();
        let descendants = self.nodes.descendants(&ids, levels).await?;
        let builder = TreeBuilder::new(descendants, locale);
        Ok(nodes.iter().map(|n| builder.build(n, levels)).collect())
    }

    pub async fn create(&self, payload: NodePayload, actor: &User) -> Result<Node, ApiError> {
        let content = match payload.content.as_deref() {
            Some(raw) => clean_content(raw)?,
            None => return Err(ApiError::field("content", "This field is required.")),
        };
        let parent = payload.parent.flatten();

        if let Some(parent_id) = parent {
            self.require_active_parent(parent_id).await?;
        }
        if self.nodes.content_taken(parent, &content, None).await? {
            return Err(duplicate_content(&content));
        }

        let node = self
            .nodes
            .create(parent, &content, actor.id)
            .await
            .map_err(|e| Self::map_unique(e, &content))?;

        audit!(node_id = node.id, user_id = actor.id, "node created");
        Ok(node)
    }

    /// PUT replaces (content required), PATCH merges. A missing `parent`
    /// keeps the current one in both cases. Checks and write share one
    /// transaction with the node row locked.
    pub async fn update(&self, id: i64, payload: NodePayload, partial: bool, actor: &User) -> Result<Node, ApiError> {
        let mut tx = self.nodes.begin().await?;
        let current = NodeRepository::lock_active(&mut *tx, id).await?;

        let content = match payload.content.as_deref() {
            Some(raw) => clean_content(raw)?,
            None if partial => current.content.clone(),
            None => return Err(ApiError::field("content", "This field is required.")),
        };
        let parent = match payload.parent {
            Some(parent) => parent,
            None => current.parent_id,
        };

        if let Some(parent_id) = parent {
            if parent_id == id {
                return Err(ApiError::field("parent", "A node cannot be its own parent."));
            }
            if parent != current.parent_id {
                NodeRepository::lock_reparenting(&mut *tx).await?;
                if NodeRepository::find_active_in(&mut *tx, parent_id).await?.is_none() {
                    return Err(invalid_parent(parent_id));
                }
                if NodeRepository::is_in_chain(&mut *tx, id, parent_id).await? {
                    return Err(ApiError::field("parent", "A node cannot be moved under one of its descendants."));
                }
            }
        }
        if NodeRepository::content_taken_in(&mut *tx, parent, &content, Some(id)).await? {
            return Err(duplicate_content(&content));
        }

        let node = NodeRepository::update(&mut *tx, id, parent, &content, actor.id)
            .await
            .map_err(|e| Self::map_unique(e, &content))?;
        tx.commit().await.map_err(DatabaseError::from)?;

        audit!(node_id = id, user_id = actor.id, "node updated");
        Ok(node)
    }

    pub async fn delete(&self, id: i64, actor: &User) -> Result<(), ApiError> {
        self.nodes.find_active_404(id).await?;

        if self.nodes.has_active_children(id).await? {
            return Err(ApiError::HasChildren("Cannot delete a node that has active children.".to_string()));
        }
        // The guarded update also covers a child created since the check
        if self.nodes.soft_delete(id, actor.id).await?.is_none() {
            return Err(ApiError::HasChildren("Cannot delete a node that has active children.".to_string()));
        }

        audit!(node_id = id, user_id = actor.id, "node deleted");
        Ok(())
    }

    pub async fn restore(&self, id: i64, actor: &User) -> Result<Node, ApiError> {
        let node = self
            .nodes
            .find_any(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Node {} not found", id)))?;
        if !node.is_deleted {
            return Err(ApiError::bad_request(format!("Node {} is not deleted.", id)));
        }

        if let Some(parent_id) = node.parent_id {
            if self.nodes.find_active(parent_id).await?.is_none() {
                return Err(ApiError::field("parent", "The parent node is deleted; restore it first."));
            }
        }
        if self.nodes.content_taken(node.parent_id, &node.content, Some(id)).await? {
            return Err(duplicate_content(&node.content));
        }

        let restored = self
            .nodes
            .restore(id, actor.id)
            .await
            .map_err(|e| Self::map_unique(e, &node.content))?;

        audit!(node_id = id, user_id = actor.id, "node restored");
        Ok(restored)
    }

    async fn require_active_parent(&self, parent_id: i64) -> Result<(), ApiError> {
        match self.nodes.find_active(parent_id).await? {
            Some(_) => Ok(()),
            None => Err(invalid_parent(parent_id)),
        }
    }

    fn map_unique(err: DatabaseError, content: &str) -> ApiError {
        if err.is_unique_violation_of(ACTIVE_CONTENT_INDEX) {
            duplicate_content(content)
        } else {
            err.into()
        }
    }
}
