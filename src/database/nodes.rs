use sqlx::{PgConnection, PgExecutor, PgPool, Postgres, Transaction};

use super::manager::DatabaseError;
use super::models::{Node, NodeAtLevel};

const NODE_COLUMNS: &str =
    "id, parent_id, content, is_deleted, deleted_at, created_at, updated_at, created_by, updated_by";

/// Partial unique index guarding active content per parent scope
pub const ACTIVE_CONTENT_INDEX: &str = "nodes_active_content_key";

/// Transaction-scoped advisory lock taken by every re-parenting update
const REPARENT_LOCK_KEY: i64 = 0x6e6f_646f_735f_7265;

/// Recursion bound for the subtree CTE
fn level_bound(levels: u32) -> i32 {
    i32::try_from(levels).unwrap_or(i32::MAX)
}

pub struct NodeRepository {
    pool: PgPool,
}

impl NodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        Ok(self.pool.begin().await?)
    }

    /// Active node by id
    pub async fn find_active(&self, id: i64) -> Result<Option<Node>, DatabaseError> {
        Self::find_active_in(&self.pool, id).await
    }

    pub async fn find_active_in<'e, E>(executor: E, id: i64) -> Result<Option<Node>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = $1 AND NOT is_deleted");
        let node = sqlx::query_as::<_, Node>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(node)
    }

    /// Active node by id, row-locked until the transaction ends
    pub async fn lock_active(conn: &mut PgConnection, id: i64) -> Result<Node, DatabaseError> {
        let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = $1 AND NOT is_deleted FOR UPDATE");
        sqlx::query_as::<_, Node>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Node {} not found", id)))
    }

    /// Serializes parent changes so concurrent moves cannot form a loop
    pub async fn lock_reparenting(conn: &mut PgConnection) -> Result<(), DatabaseError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(REPARENT_LOCK_KEY)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Node by id regardless of soft-delete state
    pub async fn find_any(&self, id: i64) -> Result<Option<Node>, DatabaseError> {
        let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = $1");
        let node = sqlx::query_as::<_, Node>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(node)
    }

    pub async fn find_active_404(&self, id: i64) -> Result<Node, DatabaseError> {
        self.find_active(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Node {} not found", id)))
    }

    /// Active nodes under `parent` (roots when None), ordered by id
    pub async fn list_active(&self, parent: Option<i64>, limit: i64, offset: i64) -> Result<Vec<Node>, DatabaseError> {
        let sql = format!(
            "SELECT {NODE_COLUMNS} FROM nodes
             WHERE NOT is_deleted AND parent_id IS NOT DISTINCT FROM $1
             ORDER BY id
             LIMIT $2 OFFSET $3"
        );
        let nodes = sqlx::query_as::<_, Node>(&sql)
            .bind(parent)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(nodes)
    }

    pub async fn count_active(&self, parent: Option<i64>) -> Result<i64, DatabaseError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM nodes WHERE NOT is_deleted AND parent_id IS NOT DISTINCT FROM $1",
        )
        .bind(parent)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Active nodes created by a user, newest first
    pub async fn list_by_creator(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<Node>, DatabaseError> {
        let sql = format!(
            "SELECT {NODE_COLUMNS} FROM nodes
             WHERE NOT is_deleted AND created_by = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        let nodes = sqlx::query_as::<_, Node>(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(nodes)
    }

    pub async fn count_by_creator(&self, user_id: i64) -> Result<i64, DatabaseError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM nodes WHERE NOT is_deleted AND created_by = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Active descendants of `roots` down to `levels` generations.
    /// Direct children are level 1. A deleted node hides its whole subtree.
    pub async fn descendants(&self, roots: &[i64], levels: u32) -> Result<Vec<NodeAtLevel>, DatabaseError> {
        if roots.is_empty() || levels == 0 {
            return Ok(Vec::new());
        }

        let sql = format!(
            "WITH RECURSIVE subtree AS (
                 SELECT {NODE_COLUMNS}, 1 AS level
                 FROM nodes
                 WHERE parent_id = ANY($1) AND NOT is_deleted
               UNION ALL
                 SELECT c.id, c.parent_id, c.content, c.is_deleted, c.deleted_at, c.created_at,
                        c.updated_at, c.created_by, c.updated_by, s.level + 1
                 FROM nodes c
                 JOIN subtree s ON c.parent_id = s.id
                 WHERE NOT c.is_deleted AND s.level < $2
             )
             SELECT {NODE_COLUMNS}, level FROM subtree ORDER BY level, id"
        );

        let rows = sqlx::query_as::<_, NodeAtLevel>(&sql)
            .bind(roots)
            .bind(level_bound(levels))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn has_active_children(&self, id: i64) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM nodes WHERE parent_id = $1 AND NOT is_deleted)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Whether an active node in the scope already uses `content` (case-insensitive)
    pub async fn content_taken(
        &self,
        parent: Option<i64>,
        content: &str,
        exclude: Option<i64>,
    ) -> Result<bool, DatabaseError> {
        Self::content_taken_in(&self.pool, parent, content, exclude).await
    }

    pub async fn content_taken_in<'e, E>(
        executor: E,
        parent: Option<i64>,
        content: &str,
        exclude: Option<i64>,
    ) -> Result<bool, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM nodes
                 WHERE NOT is_deleted
                   AND parent_id IS NOT DISTINCT FROM $1
                   AND lower(content) = lower($2)
                   AND ($3::BIGINT IS NULL OR id <> $3)
             )",
        )
        .bind(parent)
        .bind(content)
        .bind(exclude)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    /// True when `ancestor` appears on the parent chain of `candidate` (inclusive)
    pub async fn is_in_chain<'e, E>(executor: E, ancestor: i64, candidate: i64) -> Result<bool, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let found: bool = sqlx::query_scalar(
            "WITH RECURSIVE chain AS (
                 SELECT id, parent_id FROM nodes WHERE id = $1
               UNION
                 SELECT n.id, n.parent_id FROM nodes n JOIN chain c ON n.id = c.parent_id
             )
             SELECT EXISTS (SELECT 1 FROM chain WHERE id = $2)",
        )
        .bind(candidate)
        .bind(ancestor)
        .fetch_one(executor)
        .await?;
        Ok(found)
    }

    pub async fn create(&self, parent: Option<i64>, content: &str, created_by: i64) -> Result<Node, DatabaseError> {
        Self::insert(&self.pool, parent, content, Some(created_by)).await
    }

    /// Insert through any executor so seeding can run inside a transaction
    pub async fn insert<'e, E>(
        executor: E,
        parent: Option<i64>,
        content: &str,
        created_by: Option<i64>,
    ) -> Result<Node, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "INSERT INTO nodes (parent_id, content, created_by, updated_by)
             VALUES ($1, $2, $3, $3)
             RETURNING {NODE_COLUMNS}"
        );
        let node = sqlx::query_as::<_, Node>(&sql)
            .bind(parent)
            .bind(content)
            .bind(created_by)
            .fetch_one(executor)
            .await?;
        Ok(node)
    }

    pub async fn update<'e, E>(
        executor: E,
        id: i64,
        parent: Option<i64>,
        content: &str,
        updated_by: i64,
    ) -> Result<Node, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "UPDATE nodes
             SET parent_id = $2, content = $3, updated_by = $4, updated_at = NOW()
             WHERE id = $1 AND NOT is_deleted
             RETURNING {NODE_COLUMNS}"
        );
        sqlx::query_as::<_, Node>(&sql)
            .bind(id)
            .bind(parent)
            .bind(content)
            .bind(updated_by)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Node {} not found", id)))
    }

    /// Mark deleted, but only while no active child exists
    pub async fn soft_delete(&self, id: i64, deleted_by: i64) -> Result<Option<Node>, DatabaseError> {
        let sql = format!(
            "UPDATE nodes
             SET is_deleted = TRUE, deleted_at = NOW(), updated_by = $2, updated_at = NOW()
             WHERE id = $1 AND NOT is_deleted
               AND NOT EXISTS (SELECT 1 FROM nodes c WHERE c.parent_id = $1 AND NOT c.is_deleted)
             RETURNING {NODE_COLUMNS}"
        );
        let node = sqlx::query_as::<_, Node>(&sql)
            .bind(id)
            .bind(deleted_by)
            .fetch_optional(&self.pool)
            .await?;
        Ok(node)
    }

    pub async fn restore(&self, id: i64, restored_by: i64) -> Result<Node, DatabaseError> {
        let sql = format!(
            "UPDATE nodes
             SET is_deleted = FALSE, deleted_at = NULL, updated_by = $2, updated_at = NOW()
             WHERE id = $1 AND is_deleted
             RETURNING {NODE_COLUMNS}"
        );
        sqlx::query_as::<_, Node>(&sql)
            .bind(id)
            .bind(restored_by)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Deleted node {} not found", id)))
    }

    /// Hard-delete every node (seeding only). Parent links are cut first so
    /// the self reference never blocks the delete.
    pub async fn purge_all(conn: &mut PgConnection) -> Result<u64, DatabaseError> {
        sqlx::query("UPDATE nodes SET parent_id = NULL WHERE parent_id IS NOT NULL")
            .execute(&mut *conn)
            .await?;
        let deleted = sqlx::query("DELETE FROM nodes").execute(&mut *conn).await?;
        Ok(deleted.rows_affected())
    }

    /// Totals over the whole table: (nodes, roots, leaves)
    pub async fn tree_stats<'e, E>(executor: E) -> Result<(i64, i64, i64), DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let stats = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT COUNT(*),
                    COUNT(*) FILTER (WHERE parent_id IS NULL),
                    COUNT(*) FILTER (WHERE NOT EXISTS (SELECT 1 FROM nodes c WHERE c.parent_id = n.id))
             FROM nodes n",
        )
        .fetch_one(executor)
        .await?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_bound_saturates() {
        assert_eq!(level_bound(0), 0);
        assert_eq!(level_bound(10), 10);
        assert_eq!(level_bound(i32::MAX as u32), i32::MAX);
        assert_eq!(level_bound(u32::MAX), i32::MAX);
    }
}
