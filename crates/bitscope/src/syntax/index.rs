//! Flat key → node lookup table for one tree generation.
//!
//! UI events (a click or focus on a rendered tree row) carry only a node key.
//! The index resolves that key back to the node in O(1) without walking the
//! tree again. An index is built once per tree and never updated in place: a
//! new parse or a new filter result produces a new tree and therefore a new
//! index with the next [`Generation`].
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::warn;

use super::node::{DataNode, for_each_pre_order};

/// Identifies one complete tree produced by a parse or filter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// The generation that follows this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a generation-checked lookup found nothing. Both cases are normal
/// outcomes of events racing a tree replacement and callers treat them as
/// no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMiss {
    /// The key is not part of the current tree.
    NotFound,
    /// The event was produced against a tree that has since been replaced.
    Stale {
        requested: Generation,
        current: Generation,
    },
}

impl fmt::Display for LookupMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupMiss::NotFound => write!(f, "node not found"),
            LookupMiss::Stale { requested, current } => {
                write!(f, "stale generation {} (current {})", requested, current)
            }
        }
    }
}

/// Key → node map covering every node of a tree, root included.
#[derive(Debug, Clone)]
pub struct SyntaxIndex {
    generation: Generation,
    root: Arc<DataNode>,
    nodes: HashMap<String, Arc<DataNode>>,
}

impl SyntaxIndex {
    /// Index `root` as generation zero.
    pub fn build(root: &Arc<DataNode>) -> Self {
        Self::build_for(root, Generation::default())
    }

    /// Index `root` and tag the result with `generation`.
    ///
    /// The tree is walked once in pre-order. Keys are expected to be unique
    /// per tree; when they are not, the node visited last keeps the key.
    pub fn build_for(root: &Arc<DataNode>, generation: Generation) -> Self {
        let mut nodes: HashMap<String, Arc<DataNode>> = HashMap::new();
        for_each_pre_order(root, |node| {
            if let Some(previous) = nodes.insert(node.key.clone(), Arc::clone(node)) {
                warn!(
                    "duplicate syntax key {:?} in generation {} ({:?} replaced by {:?})",
                    node.key, generation, previous.title, node.title
                );
            }
        });
        Self {
            generation,
            root: Arc::clone(root),
            nodes,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The tree this index was built from.
    pub fn root(&self) -> &Arc<DataNode> {
        &self.root
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn lookup(&self, key: &str) -> Option<&Arc<DataNode>> {
        self.nodes.get(key)
    }

    /// Lookup that also rejects events produced against another generation.
    pub fn lookup_at(
        &self,
        generation: Generation,
        key: &str,
    ) -> Result<&Arc<DataNode>, LookupMiss> {
        if generation != self.generation {
            return Err(LookupMiss::Stale {
                requested: generation,
                current: self.generation,
            });
        }
        self.lookup(key).ok_or(LookupMiss::NotFound)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    /// All indexed keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }
}
