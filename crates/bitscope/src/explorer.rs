//! Inspector session: buffer, syntax tree, search filter, key index and
//! selection state kept together.
//!
//! The [`Explorer`] is the only writer of that state. Every input change
//! (a new buffer, a new search text, a focused tree row) is handled
//! synchronously and replaces derived structures wholesale:
//!
//! ```text
//! load_buffer ──► parser ──► source tree ──► filter ──► view tree ──► SyntaxIndex
//!                                              ▲                          │
//!                                   set_filter ┘              focus(key) ─┘──► Selection
//! ```
//!
//! Every view tree gets a fresh [`Generation`]. Focus events that carry a
//! key from an older generation, or a key that no longer exists, are ignored.
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::binutil::ParseError;
use crate::metrics::{CounterId, Metrics};
use crate::range::{BitRange, RangeError};
use crate::selection::{Color, ColorPriority, Palette, Selection};
use crate::syntax::{
    DataNode, Generation, LookupMiss, SyntaxIndex, SyntaxParser, filter_tree_or,
};

/// Settings for a new [`Explorer`].
#[derive(Debug, Clone, Default)]
pub struct ExplorerConfig {
    /// Colors assigned to active selections by list position.
    pub palette: Palette,
    /// Which selection wins when several match the same cell.
    pub priority: ColorPriority,
    /// Initial value of the "show hidden syntax" rendering flag.
    pub show_hidden_syntax: bool,
}

impl ExplorerConfig {
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_priority(mut self, priority: ColorPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_show_hidden_syntax(mut self, show: bool) -> Self {
        self.show_hidden_syntax = show;
        self
    }
}

/// Why a focus event did not change the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The key could not be resolved in the current generation.
    Miss(LookupMiss),
    /// The node has `size == 0`.
    ZeroWidth,
}

/// Outcome of [`Explorer::focus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// The selection is now exactly this range.
    Selected(BitRange),
    /// The node's extent already is the sole active selection.
    Unchanged,
    /// Nothing happened.
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy)]
struct ExplorerCounters {
    parse: CounterId,
    parse_error: CounterId,
    filter: CounterId,
    index_build: CounterId,
    focus: CounterId,
    focus_ignored: CounterId,
    selection_change: CounterId,
}

impl ExplorerCounters {
    fn register(metrics: &mut Metrics) -> Self {
        Self {
            parse: metrics.register("parse"),
            parse_error: metrics.register("parse_error"),
            filter: metrics.register("filter"),
            index_build: metrics.register("index_build"),
            focus: metrics.register("focus"),
            focus_ignored: metrics.register("focus_ignored"),
            selection_change: metrics.register("selection_change"),
        }
    }
}

/// One inspector session over a single buffer at a time.
pub struct Explorer<P: SyntaxParser> {
    parser: P,
    config: ExplorerConfig,
    buffer: Vec<u8>,
    source: Arc<DataNode>,
    empty: Arc<DataNode>,
    filter: String,
    index: SyntaxIndex,
    selection: Selection,
    show_hidden_syntax: bool,
    metrics: Metrics,
    counters: ExplorerCounters,
}

fn parse_buffer<P: SyntaxParser>(
    parser: &P,
    metrics: &mut Metrics,
    counters: &ExplorerCounters,
    empty: &Arc<DataNode>,
    bytes: &[u8],
) -> Result<Arc<DataNode>, ParseError> {
    if bytes.is_empty() {
        debug!("empty buffer, using the empty syntax tree");
        return Ok(Arc::clone(empty));
    }
    metrics.increment(counters.parse);
    match parser.parse(bytes) {
        Ok(tree) => {
            debug!("parsed {} bytes into {} nodes", bytes.len(), tree.count_nodes());
            Ok(Arc::new(tree))
        }
        Err(e) => {
            metrics.increment(counters.parse_error);
            warn!("failed to parse {} byte buffer: {}", bytes.len(), e);
            Err(e)
        }
    }
}

impl<P: SyntaxParser> Explorer<P> {
    pub fn new(parser: P) -> Self {
        Self::with_config(parser, ExplorerConfig::default())
    }

    pub fn with_config(parser: P, config: ExplorerConfig) -> Self {
        let mut metrics = Metrics::new();
        let counters = ExplorerCounters::register(&mut metrics);
        let empty = Arc::new(DataNode::empty());
        let index = SyntaxIndex::build(&empty);
        metrics.increment(counters.index_build);
        Self {
            parser,
            selection: Selection::new(config.palette.clone(), config.priority),
            show_hidden_syntax: config.show_hidden_syntax,
            config,
            buffer: Vec::new(),
            source: Arc::clone(&empty),
            empty,
            filter: String::new(),
            index,
            metrics,
            counters,
        }
    }

    /// Install a new buffer and parse it.
    ///
    /// A zero-length buffer means "no data" and installs the empty syntax
    /// tree without calling the parser. When the parser fails, the previous
    /// buffer, tree and selection stay in place and the error is returned.
    /// On success the current search text is applied to the new tree and
    /// the selection is cleared.
    pub fn load_buffer(&mut self, bytes: impl Into<Vec<u8>>) -> Result<(), ParseError> {
        let bytes = bytes.into();
        let tree = parse_buffer(
            &self.parser,
            &mut self.metrics,
            &self.counters,
            &self.empty,
            &bytes,
        )?;
        self.buffer = bytes;
        self.install(tree);
        Ok(())
    }

    /// Parse the current buffer again, discarding the selection.
    pub fn reset(&mut self) -> Result<(), ParseError> {
        let tree = parse_buffer(
            &self.parser,
            &mut self.metrics,
            &self.counters,
            &self.empty,
            &self.buffer,
        )?;
        self.install(tree);
        Ok(())
    }

    fn install(&mut self, tree: Arc<DataNode>) {
        self.source = tree;
        self.rebuild_view();
        if self.selection.clear() {
            self.metrics.increment(self.counters.selection_change);
        }
    }

    fn rebuild_view(&mut self) {
        if !self.filter.is_empty() {
            self.metrics.increment(self.counters.filter);
        }
        let view = filter_tree_or(&self.source, &self.filter, &self.empty);
        let generation = self.index.generation().next();
        self.index = SyntaxIndex::build_for(&view, generation);
        self.metrics.increment(self.counters.index_build);
        debug!(
            "syntax generation {}: {} keys (filter {:?})",
            generation,
            self.index.len(),
            self.filter
        );
    }

    /// Change the search text. Returns `false` if it is unchanged.
    ///
    /// Selections are kept: filtering never changes a node's extent.
    pub fn set_filter(&mut self, text: &str) -> bool {
        if text == self.filter {
            return false;
        }
        self.filter = text.to_string();
        self.rebuild_view();
        true
    }

    pub fn filter_text(&self) -> &str {
        &self.filter
    }

    /// Focus the node `key` of the current generation.
    pub fn focus(&mut self, key: &str) -> Result<Focus, RangeError> {
        self.focus_at(self.generation(), key)
    }

    /// Focus the node `key` as seen in `generation`.
    ///
    /// Unknown keys, stale generations and zero-width nodes are ignored.
    /// Otherwise the selection becomes the node's extent alone, unless that
    /// is already the case. A node whose extent overflows the address space
    /// is a parser bug and is reported as an error.
    pub fn focus_at(&mut self, generation: Generation, key: &str) -> Result<Focus, RangeError> {
        self.metrics.increment(self.counters.focus);
        let found = self
            .index
            .lookup_at(generation, key)
            .map(|node| (node.is_selectable(), node.bit_range()));
        let range = match found {
            Err(miss) => return Ok(self.ignore(key, IgnoreReason::Miss(miss))),
            Ok((false, _)) => return Ok(self.ignore(key, IgnoreReason::ZeroWidth)),
            Ok((true, range)) => range.inspect_err(|e| {
                warn!("node {:?} has an invalid extent: {}", key, e);
            })?,
        };

        if let [current] = self.selection.ranges() {
            if *current == range {
                return Ok(Focus::Unchanged);
            }
        }
        if self.selection.set_selections(vec![range]) {
            self.metrics.increment(self.counters.selection_change);
        }
        Ok(Focus::Selected(range))
    }

    fn ignore(&mut self, key: &str, reason: IgnoreReason) -> Focus {
        trace!("focus on {:?} ignored: {:?}", key, reason);
        self.metrics.increment(self.counters.focus_ignored);
        Focus::Ignored(reason)
    }

    /// Replace the active selections. Returns `false` when nothing changed.
    pub fn set_selections(&mut self, ranges: Vec<BitRange>) -> bool {
        let changed = self.selection.set_selections(ranges);
        if changed {
            self.metrics.increment(self.counters.selection_change);
        }
        changed
    }

    pub fn clear_selection(&mut self) -> bool {
        self.set_selections(Vec::new())
    }

    pub fn color_for_bit(&self, bit: u64) -> Option<Color> {
        self.selection.color_for_bit(bit)
    }

    pub fn color_for_byte(&self, byte: u64) -> Option<Color> {
        self.selection.color_for_byte(byte)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn has_data(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// The tree to display: the parsed tree with the search filter applied.
    pub fn syntax(&self) -> &Arc<DataNode> {
        self.index.root()
    }

    /// The parsed tree before filtering.
    pub fn source_syntax(&self) -> &Arc<DataNode> {
        &self.source
    }

    pub fn index(&self) -> &SyntaxIndex {
        &self.index
    }

    pub fn generation(&self) -> Generation {
        self.index.generation()
    }

    pub fn lookup(&self, key: &str) -> Option<&Arc<DataNode>> {
        self.index.lookup(key)
    }

    pub fn show_hidden_syntax(&self) -> bool {
        self.show_hidden_syntax
    }

    pub fn set_show_hidden_syntax(&mut self, show: bool) {
        self.show_hidden_syntax = show;
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }
}
