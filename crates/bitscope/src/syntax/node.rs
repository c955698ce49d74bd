//! Syntax tree node produced by a parser.
use std::sync::Arc;

use crate::range::{BitRange, RangeError};

/// Key of the sentinel tree shown when there is no data.
pub const EMPTY_TREE_KEY: &str = "root";
/// Title of the sentinel tree shown when there is no data.
pub const EMPTY_TREE_TITLE: &str = "Empty bitstream";

/// One labeled region of the buffer.
///
/// `start` and `size` are measured in bits. A node with `size == 0` is a
/// zero-width marker and is never selectable. Children are kept in document
/// order and shared through `Arc`, so derived trees (for example a filtered
/// view) can reuse untouched subtrees of the tree they were derived from.
/// Nodes are never mutated once a tree has been built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataNode {
    pub key: String,
    pub title: String,
    pub start: u64,
    pub size: u64,
    pub children: Option<Vec<Arc<DataNode>>>,
}

impl DataNode {
    pub fn new(key: impl Into<String>, title: impl Into<String>, start: u64, size: u64) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            start,
            size,
            children: None,
        }
    }

    /// The sentinel tree used when no buffer is loaded or a filter removed
    /// every node.
    pub fn empty() -> Self {
        Self::new(EMPTY_TREE_KEY, EMPTY_TREE_TITLE, 0, 0)
    }

    /// Replace the children of this node.
    pub fn with_children(mut self, children: Vec<DataNode>) -> Self {
        self.children = Some(children.into_iter().map(Arc::new).collect());
        self
    }

    /// Replace the children of this node with already shared subtrees.
    pub fn with_shared_children(mut self, children: Vec<Arc<DataNode>>) -> Self {
        self.children = Some(children);
        self
    }

    /// Children in document order (empty for leaves).
    pub fn children(&self) -> &[Arc<DataNode>] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Zero-width nodes cannot be turned into a selection.
    pub fn is_selectable(&self) -> bool {
        self.size > 0
    }

    /// `[start, start + size)` as a [`BitRange`].
    pub fn bit_range(&self) -> Result<BitRange, RangeError> {
        BitRange::from_extent(self.start, self.size)
    }

    /// Inclusive `(first, last)` byte indices covered by the node, as shown
    /// next to its label in a tree view. `None` for zero-width nodes.
    pub fn byte_span(&self) -> Option<(u64, u64)> {
        if self.size == 0 {
            return None;
        }
        let last_bit = self.start.saturating_add(self.size - 1);
        Some((self.start / 8, last_bit / 8))
    }

    /// `true` when this node is structurally equal to [`DataNode::empty`].
    pub fn is_empty_tree(&self) -> bool {
        self.key == EMPTY_TREE_KEY
            && self.title == EMPTY_TREE_TITLE
            && self.start == 0
            && self.size == 0
            && self.children.is_none()
    }

    /// Total number of nodes in this subtree, including this node.
    pub fn count_nodes(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&DataNode> = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children().iter().map(|c| c.as_ref()));
        }
        count
    }
}

/// Visit `root` and all of its descendants in pre-order (a node before its
/// children, children in document order).
///
/// Uses an explicit stack, so tree depth is not limited by the call stack.
pub fn for_each_pre_order(root: &Arc<DataNode>, mut cb: impl FnMut(&Arc<DataNode>)) {
    let mut stack: Vec<&Arc<DataNode>> = vec![root];
    while let Some(node) = stack.pop() {
        cb(node);
        stack.extend(node.children().iter().rev());
    }
}

/// Build a stable key string from a child-index path, e.g. `[0, 2, 1]`
/// becomes `"0.2.1"`. The empty path is the root key.
pub fn path_key(path: &[usize]) -> String {
    if path.is_empty() {
        return EMPTY_TREE_KEY.to_string();
    }
    path.iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_span() {
        assert_eq!(DataNode::new("a", "a", 16, 8).byte_span(), Some((2, 2)));
        assert_eq!(DataNode::new("a", "a", 12, 8).byte_span(), Some((1, 2)));
        assert_eq!(DataNode::new("a", "a", 7, 1).byte_span(), Some((0, 0)));
        assert_eq!(DataNode::new("a", "a", 16, 0).byte_span(), None);
    }

    #[test]
    fn test_pre_order() {
        let root = Arc::new(DataNode::new("root", "r", 0, 0).with_children(vec![
            DataNode::new("0", "a", 0, 8).with_children(vec![DataNode::new("0.0", "b", 0, 4)]),
            DataNode::new("1", "c", 8, 8),
        ]));
        let mut keys = Vec::new();
        for_each_pre_order(&root, |n| keys.push(n.key.clone()));
        assert_eq!(keys, vec!["root", "0", "0.0", "1"]);
        assert_eq!(root.count_nodes(), 4);
    }

    #[test]
    fn test_path_key() {
        assert_eq!(path_key(&[]), "root");
        assert_eq!(path_key(&[0]), "0");
        assert_eq!(path_key(&[1, 12, 3]), "1.12.3");
    }

    #[test]
    fn test_empty_tree() {
        let empty = DataNode::empty();
        assert!(empty.is_empty_tree());
        assert!(empty.is_leaf());
        assert!(!empty.is_selectable());
        assert!(!DataNode::empty().with_children(vec![]).is_empty_tree());
    }
}
