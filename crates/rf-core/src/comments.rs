//! # Comment Trees
//!
//! Turns the flat comment rows of a post into a nested reply tree with the
//! depth of every node computed once, here, rather than by each renderer.
//!
//! Nesting stops at `max_depth`. A node at that depth keeps all of its
//! descendants, listed flat in conversational order, and is flagged with
//! `continues_thread` so the page can link to a continuation view.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{CommentNode, CommentRecord};
use crate::traits::CommentPort;

/// Assembles flat comment records into root-level [`CommentNode`]s.
///
/// Roots and siblings are ordered oldest first (ties by id). A record whose
/// parent is missing from the input is promoted to a root. Records caught in
/// a parent cycle that no root reaches are promoted too, earliest first,
/// after the regular roots.
pub fn build_tree(flat_comments: Vec<CommentRecord>, max_depth: usize) -> Vec<CommentNode> {
    TreeAssembler::new(flat_comments, max_depth).assemble()
}

struct TreeAssembler {
    /// Records not yet placed in the tree. Removal marks a record as placed,
    /// so no id is ever visited twice, which also breaks parent cycles.
    pending: HashMap<Uuid, CommentRecord>,
    children: HashMap<Uuid, Vec<Uuid>>,
    roots: Vec<Uuid>,
    /// Every id once, in conversational order.
    ordered: Vec<Uuid>,
    max_depth: usize,
}

impl TreeAssembler {
    fn new(flat_comments: Vec<CommentRecord>, max_depth: usize) -> Self {
        let mut pending: HashMap<Uuid, CommentRecord> = HashMap::with_capacity(flat_comments.len());
        for record in flat_comments {
            pending.entry(record.id).or_insert(record);
        }

        let mut ordered: Vec<&CommentRecord> = pending.values().collect();
        ordered.sort_by_key(|record| (record.created_at, record.id));

        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        let mut roots = Vec::new();
        for record in &ordered {
            match record.parent_id {
                Some(parent) if pending.contains_key(&parent) => {
                    children.entry(parent).or_default().push(record.id);
                }
                _ => roots.push(record.id),
            }
        }
        let ordered = ordered.into_iter().map(|record| record.id).collect();

        Self {
            pending,
            children,
            roots,
            ordered,
            max_depth,
        }
    }

    fn assemble(mut self) -> Vec<CommentNode> {
        let mut nodes = Vec::with_capacity(self.roots.len());

        for id in std::mem::take(&mut self.roots) {
            if let Some(node) = self.attach(id, 0) {
                nodes.push(node);
            }
        }

        for id in std::mem::take(&mut self.ordered) {
            if let Some(node) = self.attach(id, 0) {
                nodes.push(node);
            }
        }

        nodes
    }

    /// Places `id` at `depth` along with its subtree. `None` if already placed.
    fn attach(&mut self, id: Uuid, depth: usize) -> Option<CommentNode> {
        let record = self.pending.remove(&id)?;
        let mut node = CommentNode::leaf(record, depth);

        if depth >= self.max_depth {
            node.replies = self.flatten_descendants(id);
            node.continues_thread = !node.replies.is_empty();
            return Some(node);
        }

        let kids = self.children.remove(&id).unwrap_or_default();
        node.replies = kids
            .into_iter()
            .filter_map(|kid| self.attach(kid, depth + 1))
            .collect();
        Some(node)
    }

    /// Pre-order walk below a boundary node. Every descendant becomes a
    /// childless node pinned at `max_depth`.
    fn flatten_descendants(&mut self, id: Uuid) -> Vec<CommentNode> {
        let mut flat = Vec::new();
        let mut stack: Vec<Uuid> = self.children.remove(&id).unwrap_or_default();
        stack.reverse();

        while let Some(next) = stack.pop() {
            let Some(record) = self.pending.remove(&next) else {
                continue;
            };
            flat.push(CommentNode::leaf(record, self.max_depth));
            if let Some(mut kids) = self.children.remove(&next) {
                kids.reverse();
                stack.extend(kids);
            }
        }

        flat
    }
}

/// Loads a post's comments through the port and builds the reply tree.
pub struct CommentThreadLoader {
    port: Arc<dyn CommentPort>,
}

impl CommentThreadLoader {
    pub fn new(port: Arc<dyn CommentPort>) -> Self {
        Self { port }
    }

    pub async fn load_thread(&self, post_id: Uuid, max_depth: usize) -> Result<Vec<CommentNode>> {
        let flat = self
            .port
            .list_for_post(post_id)
            .await
            .map_err(AppError::from_port)?
            .ok_or_else(|| AppError::NotFound("Post".to_string(), post_id.to_string()))?;

        Ok(build_tree(flat, max_depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockCommentPort;
    use chrono::{DateTime, Duration, Utc};

    fn base_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn comment(id: u128, parent: Option<u128>, minutes: i64) -> CommentRecord {
        CommentRecord {
            id: Uuid::from_u128(id),
            post_id: Uuid::from_u128(999),
            parent_id: parent.map(Uuid::from_u128),
            author_id: Uuid::from_u128(500),
            body: format!("comment {id}"),
            score: 0,
            created_at: base_time() + Duration::minutes(minutes),
        }
    }

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn subtree_size(node: &CommentNode) -> usize {
        1 + node.replies.iter().map(subtree_size).sum::<usize>()
    }

    /// Ids in depth-first order.
    fn ids_in_order(nodes: &[CommentNode]) -> Vec<Uuid> {
        nodes
            .iter()
            .flat_map(|node| std::iter::once(node.comment.id).chain(ids_in_order(&node.replies)))
            .collect()
    }

    #[test]
    fn nests_replies_with_depth() {
        let tree = build_tree(
            vec![comment(3, Some(2), 2), comment(1, None, 0), comment(2, Some(1), 1)],
            10,
        );

        assert_eq!(tree.len(), 1);
        let a = &tree[0];
        assert_eq!((a.comment.id, a.depth), (id(1), 0));
        let b = &a.replies[0];
        assert_eq!((b.comment.id, b.depth), (id(2), 1));
        let c = &b.replies[0];
        assert_eq!((c.comment.id, c.depth), (id(3), 2));
        assert!(c.replies.is_empty());
        assert!(!a.continues_thread && !b.continues_thread);
    }

    #[test]
    fn boundary_node_lists_deeper_replies_flat() {
        let tree = build_tree(
            vec![comment(1, None, 0), comment(2, Some(1), 1), comment(3, Some(2), 2)],
            1,
        );

        let a = &tree[0];
        assert_eq!(a.depth, 0);
        assert_eq!(a.replies.len(), 1);
        let b = &a.replies[0];
        assert_eq!((b.comment.id, b.depth), (id(2), 1));
        assert!(b.continues_thread);
        assert_eq!(b.replies.len(), 1);
        let c = &b.replies[0];
        assert_eq!((c.comment.id, c.depth), (id(3), 1));
        assert!(c.replies.is_empty());
    }

    #[test]
    fn flattening_keeps_every_descendant_in_conversation_order() {
        // 1 -> 2 -> {3 -> 5, 4}
        let tree = build_tree(
            vec![
                comment(5, Some(3), 5),
                comment(4, Some(2), 4),
                comment(3, Some(2), 3),
                comment(2, Some(1), 1),
                comment(1, None, 0),
            ],
            1,
        );

        let b = &tree[0].replies[0];
        let flat: Vec<_> = b.replies.iter().map(|n| n.comment.id).collect();
        assert_eq!(flat, vec![id(3), id(5), id(4)]);
        assert!(b.replies.iter().all(|n| n.depth == 1 && n.replies.is_empty()));
        assert_eq!(subtree_size(&tree[0]), 5);
    }

    #[test]
    fn zero_depth_flattens_under_roots() {
        let tree = build_tree(vec![comment(1, None, 0), comment(2, Some(1), 1)], 0);
        assert_eq!(tree[0].depth, 0);
        assert!(tree[0].continues_thread);
        assert_eq!(tree[0].replies[0].depth, 0);
    }

    #[test]
    fn siblings_and_roots_ordered_oldest_first() {
        let tree = build_tree(
            vec![
                comment(10, None, 30),
                comment(11, None, 10),
                comment(12, Some(11), 50),
                comment(13, Some(11), 20),
            ],
            5,
        );
        let roots: Vec<_> = tree.iter().map(|n| n.comment.id).collect();
        assert_eq!(roots, vec![id(11), id(10)]);
        let replies: Vec<_> = tree[0].replies.iter().map(|n| n.comment.id).collect();
        assert_eq!(replies, vec![id(13), id(12)]);
    }

    #[test]
    fn orphan_is_promoted_to_root() {
        let tree = build_tree(vec![comment(1, None, 0), comment(2, Some(77), 1)], 5);
        let roots: Vec<_> = tree.iter().map(|n| (n.comment.id, n.depth)).collect();
        assert_eq!(roots, vec![(id(1), 0), (id(2), 0)]);
    }

    #[test]
    fn cycles_terminate_without_losing_comments() {
        // 1 <-> 2 form a loop, 3 replies to 2, 4 points at itself.
        let tree = build_tree(
            vec![
                comment(1, Some(2), 0),
                comment(2, Some(1), 1),
                comment(3, Some(2), 2),
                comment(4, Some(4), 3),
            ],
            5,
        );

        assert_eq!(tree.iter().map(subtree_size).sum::<usize>(), 4);
        let ids = ids_in_order(&tree);
        assert_eq!(ids, vec![id(1), id(2), id(3), id(4)]);
        assert_eq!(tree[0].replies[0].comment.id, id(2));
        assert_eq!(tree[0].replies[0].replies[0].depth, 2);
    }

    #[test]
    fn duplicate_ids_are_placed_once() {
        let mut dup = comment(2, Some(1), 1);
        dup.body = "edited copy".into();
        let tree = build_tree(vec![comment(1, None, 0), comment(2, Some(1), 1), dup], 5);
        assert_eq!(subtree_size(&tree[0]), 2);
        assert_eq!(tree[0].replies[0].comment.body, "comment 2");
    }

    #[test]
    fn empty_input_is_empty_forest() {
        assert!(build_tree(Vec::new(), 3).is_empty());
    }

    #[test]
    fn node_serializes_depth_and_replies() {
        let tree = build_tree(vec![comment(1, None, 0), comment(2, Some(1), 1)], 3);
        let json = serde_json::to_value(&tree[0]).unwrap();
        assert_eq!(json["depth"], 0);
        assert_eq!(json["replies"][0]["depth"], 1);
        assert_eq!(json["continuesThread"], false);
        assert_eq!(json["comment"]["parentId"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn loader_reports_unknown_post() {
        let mut port = MockCommentPort::new();
        port.expect_list_for_post().returning(|_| Ok(None));

        let err = CommentThreadLoader::new(Arc::new(port))
            .load_thread(Uuid::now_v7(), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));
    }

    #[tokio::test]
    async fn loader_builds_tree_from_port_rows() {
        let mut port = MockCommentPort::new();
        port.expect_list_for_post()
            .times(1)
            .returning(|_| Ok(Some(vec![comment(2, Some(1), 1), comment(1, None, 0)])));

        let tree = CommentThreadLoader::new(Arc::new(port))
            .load_thread(Uuid::from_u128(999), 3)
            .await
            .unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].replies[0].comment.id, id(2));
    }
}
