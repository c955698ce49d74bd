//! Syntax tree model, key index and title filter.
//!
//! A parser (see [`SyntaxParser`]) produces a tree of [`DataNode`]s, each
//! tagged with the bit extent it describes. The tree is immutable; the
//! [`index`] and [`filter`] modules derive new structures from it.
pub mod filter;
pub mod index;
mod node;
mod parser;

pub use filter::{filter_tree, filter_tree_or, prune};
pub use index::{Generation, LookupMiss, SyntaxIndex};
pub use node::{DataNode, EMPTY_TREE_KEY, EMPTY_TREE_TITLE, for_each_pre_order, path_key};
pub use parser::SyntaxParser;
