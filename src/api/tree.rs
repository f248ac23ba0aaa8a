use std::collections::HashMap;

use crate::database::models::{Node, NodeAtLevel};
use crate::locale::RequestLocale;

use super::format::NodeView;

/// Levels of descendants to serialize for a raw `?depth=` value.
///
/// absent or unparsable -> 1 (direct children), 0 -> none, n -> n,
/// -1 -> `max`, anything below -1 -> none. Positive values are capped at `max`.
pub fn resolve_depth(raw: Option<&str>, max: u32) -> u32 {
    let Some(depth) = raw.and_then(|v| v.trim().parse::<i64>().ok()) else {
        return 1.min(max);
    };
    match depth {
        -1 => max,
        d if d < -1 => 0,
        d => u32::try_from(d).unwrap_or(u32::MAX).min(max),
    }
}

/// Assembles serialized trees from root rows plus their flattened subtree
pub struct TreeBuilder<'a> {
    children: HashMap<i64, Vec<Node>>,
    locale: &'a RequestLocale,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(descendants: Vec<NodeAtLevel>, locale: &'a RequestLocale) -> Self {
        let mut children: HashMap<i64, Vec<Node>> = HashMap::new();
        for row in descendants {
            if let Some(parent) = row.node.parent_id {
                children.entry(parent).or_default().push(row.node);
            }
        }
        for siblings in children.values_mut() {
            siblings.sort_by_key(|n| n.id);
        }
        Self { children, locale }
    }

    /// Serialize `node` with up to `levels` generations beneath it
    pub fn build(&self, node: &Node, levels: u32) -> NodeView {
        let children = if levels == 0 {
            Vec::new()
        } else {
            self.children
                .get(&node.id)
                .map(|kids| kids.iter().map(|child| self.build(child, levels - 1)).collect())
                .unwrap_or_default()
        };
        NodeView::from_node(node, children, self.locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn node(id: i64, parent: Option<i64>) -> Node {
        Node {
            id,
            parent_id: parent,
            content: format!("node {id}"),
            is_deleted: false,
            deleted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by: Some(1),
            updated_by: Some(1),
        }
    }

    fn at(id: i64, parent: i64, level: i32) -> NodeAtLevel {
        NodeAtLevel { node: node(id, Some(parent)), level }
    }

    #[test]
    fn depth_rules() {
        assert_eq!(resolve_depth(None, 10), 1);
        assert_eq!(resolve_depth(Some("abc"), 10), 1);
        assert_eq!(resolve_depth(Some("0"), 10), 0);
        assert_eq!(resolve_depth(Some("3"), 10), 3);
        assert_eq!(resolve_depth(Some("25"), 10), 10);
        assert_eq!(resolve_depth(Some("-1"), 10), 10);
        assert_eq!(resolve_depth(Some("-2"), 10), 0);
        assert_eq!(resolve_depth(Some("99999999999"), 10), 10);
    }

    #[test]
    fn builds_nested_children_in_id_order() {
        let locale = RequestLocale::default();
        let rows = vec![at(3, 1, 1), at(2, 1, 1), at(4, 2, 2), at(5, 4, 3)];
        let builder = TreeBuilder::new(rows, &locale);
        let root = node(1, None);

        let view = builder.build(&root, 3);
        assert_eq!(view.title, "one");
        assert_eq!(view.children.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(view.children[0].children[0].id, 4);
        assert_eq!(view.children[0].children[0].children[0].id, 5);
    }

    #[test]
    fn stops_at_requested_levels() {
        let locale = RequestLocale::default();
        let builder = TreeBuilder::new(vec![at(2, 1, 1), at(3, 2, 2)], &locale);
        let root = node(1, None);

        let direct = builder.build(&root, 1);
        assert_eq!(direct.children.len(), 1);
        assert!(direct.children[0].children.is_empty());

        assert!(builder.build(&root, 0).children.is_empty());
    }
}
