//! Title search over a syntax tree.
//!
//! The filtered tree keeps:
//! - every node whose title contains the search text (case-insensitive),
//!   together with its whole original subtree,
//! - every ancestor needed to reach such a node from the root.
//!
//! Everything else is dropped. The source tree is never modified; kept
//! subtrees are shared with it and only the ancestors on a path to a match
//! are copied with a reduced child list. Clearing the search text therefore
//! gives back the original tree itself rather than a rebuilt copy.
use std::sync::Arc;

use super::node::DataNode;

fn title_matches(node: &DataNode, needle: &str) -> bool {
    node.title.to_lowercase().contains(needle)
}

struct Frame<'a> {
    node: &'a Arc<DataNode>,
    next_child: usize,
    kept: Vec<Arc<DataNode>>,
}

impl<'a> Frame<'a> {
    fn new(node: &'a Arc<DataNode>) -> Self {
        Self {
            node,
            next_child: 0,
            kept: Vec::new(),
        }
    }

    /// Copy of the frame's node with only the surviving children, or `None`
    /// if nothing below it survived.
    fn finish(self) -> Option<Arc<DataNode>> {
        if self.kept.is_empty() {
            return None;
        }
        let node = self.node;
        Some(Arc::new(
            DataNode::new(node.key.clone(), node.title.clone(), node.start, node.size)
                .with_shared_children(self.kept),
        ))
    }
}

/// Prune `root` to the nodes matching `needle` and their ancestors.
///
/// `needle` is lowercased before matching. Returns `None` when nothing in
/// the tree matches. An empty needle matches every title and returns the
/// root unchanged; [`filter_tree`] short-circuits that case before calling
/// this.
pub fn prune(root: &Arc<DataNode>, needle: &str) -> Option<Arc<DataNode>> {
    let needle = needle.to_lowercase();
    if title_matches(root, &needle) {
        return Some(Arc::clone(root));
    }

    let mut stack: Vec<Frame<'_>> = vec![Frame::new(root)];
    loop {
        let top = stack.last_mut()?;
        let node: &Arc<DataNode> = top.node;
        if let Some(child) = node.children().get(top.next_child) {
            top.next_child += 1;
            if title_matches(child, &needle) {
                top.kept.push(Arc::clone(child));
            } else if !child.is_leaf() {
                stack.push(Frame::new(child));
            }
            continue;
        }

        let frame = stack.pop()?;
        let result = frame.finish();
        match stack.last_mut() {
            Some(parent) => {
                if let Some(kept) = result {
                    parent.kept.push(kept);
                }
            }
            None => return result,
        }
    }
}

/// Filter `root` by `text`, returning [`DataNode::empty`] when nothing matches.
pub fn filter_tree(root: &Arc<DataNode>, text: &str) -> Arc<DataNode> {
    filter_tree_or(root, text, &Arc::new(DataNode::empty()))
}

/// Filter `root` by `text`, returning `empty` when nothing matches.
///
/// An empty `text` means "no filtering": `root` itself is returned without
/// walking or copying the tree.
pub fn filter_tree_or(root: &Arc<DataNode>, text: &str, empty: &Arc<DataNode>) -> Arc<DataNode> {
    if text.is_empty() {
        return Arc::clone(root);
    }
    prune(root, text).unwrap_or_else(|| Arc::clone(empty))
}
