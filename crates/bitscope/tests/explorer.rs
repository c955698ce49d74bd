use std::sync::Arc;

use bitscope::binutil::ParseError;
use bitscope::explorer::{Explorer, ExplorerConfig, Focus, IgnoreReason};
use bitscope::range::BitRange;
use bitscope::selection::{ColorPriority, PRIMARY_COLOR, Palette, SECONDARY_COLOR};
use bitscope::syntax::{DataNode, LookupMiss};

/// Parser producing a fixed tree regardless of content, with one node per
/// byte under a "Payload" group.
fn fixed_parser(buffer: &[u8]) -> Result<DataNode, ParseError> {
    let bytes = buffer
        .iter()
        .enumerate()
        .map(|(i, b)| DataNode::new(format!("b{}", i), format!("byte 0x{:02X}", b), i as u64 * 8, 8))
        .collect();
    Ok(DataNode::new("root", "root", 0, buffer.len() as u64 * 8).with_children(vec![
        DataNode::new("hdr", "Header", 0, 16),
        DataNode::new("pay", "Payload", 16, 8).with_children(vec![
            DataNode::new("n", "header-crc", 16, 8),
            DataNode::new("mark", "Marker", 20, 0),
        ]),
        DataNode::new("all", "Bytes", 0, buffer.len() as u64 * 8).with_children(bytes),
    ]))
}

fn failing_parser(_: &[u8]) -> Result<DataNode, ParseError> {
    Err(ParseError::Other("unsupported".into()))
}

fn explorer() -> Explorer<fn(&[u8]) -> Result<DataNode, ParseError>> {
    Explorer::new(fixed_parser as fn(&[u8]) -> Result<DataNode, ParseError>)
}

#[test]
fn new_session_shows_the_empty_tree() {
    let ex = explorer();
    assert!(!ex.has_data());
    assert!(ex.syntax().is_empty_tree());
    assert_eq!(ex.index().len(), 1);
    assert!(ex.selection().is_empty());
}

#[test]
fn empty_buffer_installs_the_sentinel_without_parsing() {
    let mut ex = Explorer::new(failing_parser);
    ex.load_buffer(Vec::new()).unwrap();
    assert_eq!(ex.syntax().title, "Empty bitstream");
    assert!(ex.syntax().children.is_none());
    assert_eq!(ex.metrics().get("parse"), Some(0));
}

#[test]
fn loading_a_buffer_builds_tree_and_index() {
    let mut ex = explorer();
    let before = ex.generation();
    ex.load_buffer(vec![0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
    assert!(ex.has_data());
    assert_eq!(ex.buffer(), &[0xAA, 0xBB, 0xCC, 0xDD]);
    assert!(ex.generation() > before);
    assert_eq!(ex.index().len(), ex.syntax().count_nodes());
    assert_eq!(ex.lookup("b2").unwrap().title, "byte 0xCC");
    assert_eq!(ex.metrics().get("parse"), Some(1));
}

#[test]
fn focusing_a_node_selects_its_extent() {
    let mut ex = explorer();
    ex.load_buffer(vec![0; 4]).unwrap();
    let focus = ex.focus("n").unwrap();
    assert_eq!(focus, Focus::Selected(BitRange::new(16, 24).unwrap()));
    assert_eq!(ex.selection().ranges(), &[BitRange::new(16, 24).unwrap()]);
    assert_eq!(ex.color_for_byte(2), Some(PRIMARY_COLOR));
    assert_eq!(ex.color_for_byte(1), None);
    assert_eq!(ex.color_for_bit(16), Some(PRIMARY_COLOR));
    assert_eq!(ex.color_for_bit(24), None);
}

#[test]
fn refocusing_the_same_extent_changes_nothing() {
    let mut ex = explorer();
    ex.load_buffer(vec![0; 4]).unwrap();
    ex.focus("n").unwrap();
    let revision = ex.selection().revision();
    let ranges = ex.selection().ranges().to_vec();

    assert_eq!(ex.focus("n").unwrap(), Focus::Unchanged);
    // "pay" covers exactly the same bits as "n"
    assert_eq!(ex.focus("pay").unwrap(), Focus::Unchanged);
    assert_eq!(ex.selection().revision(), revision);
    assert_eq!(ex.selection().ranges(), ranges.as_slice());
}

#[test]
fn focus_ignores_zero_width_and_unknown_nodes() {
    let mut ex = explorer();
    ex.load_buffer(vec![0; 4]).unwrap();
    ex.focus("hdr").unwrap();
    let revision = ex.selection().revision();

    assert_eq!(
        ex.focus("mark").unwrap(),
        Focus::Ignored(IgnoreReason::ZeroWidth)
    );
    assert_eq!(
        ex.focus("gone").unwrap(),
        Focus::Ignored(IgnoreReason::Miss(LookupMiss::NotFound))
    );
    assert_eq!(ex.selection().revision(), revision);
    assert_eq!(ex.metrics().get("focus_ignored"), Some(2));
}

#[test]
fn focus_from_a_superseded_generation_is_ignored() {
    let mut ex = explorer();
    ex.load_buffer(vec![0; 4]).unwrap();
    let old = ex.generation();
    ex.set_filter("crc");
    assert!(matches!(
        ex.focus_at(old, "n").unwrap(),
        Focus::Ignored(IgnoreReason::Miss(LookupMiss::Stale { .. }))
    ));
    assert!(matches!(
        ex.focus_at(ex.generation(), "n").unwrap(),
        Focus::Selected(_)
    ));
}

#[test]
fn overflowing_extent_is_an_error() {
    let mut ex = Explorer::new(|_: &[u8]| -> Result<DataNode, ParseError> {
        Ok(DataNode::new("root", "root", 0, 8)
            .with_children(vec![DataNode::new("bad", "bad", u64::MAX, 8)]))
    });
    ex.load_buffer(vec![1]).unwrap();
    assert!(ex.focus("bad").is_err());
    assert!(ex.selection().is_empty());
}

#[test]
fn filtering_keeps_ancestors_and_clearing_restores_the_source() {
    let mut ex = explorer();
    ex.load_buffer(vec![0x12, 0x34, 0x56]).unwrap();
    let source = Arc::clone(ex.source_syntax());

    assert!(ex.set_filter("head"));
    let view = ex.syntax();
    let titles: Vec<&str> = view.children().iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Header", "Payload"]);
    assert_eq!(view.children()[1].children().len(), 1);
    assert!(ex.lookup("b0").is_none());
    assert!(ex.lookup("n").is_some());

    assert!(!ex.set_filter("head"));
    assert!(ex.set_filter(""));
    assert!(Arc::ptr_eq(ex.syntax(), &source));
    assert!(ex.lookup("b0").is_some());
}

#[test]
fn filter_with_no_match_shows_the_sentinel() {
    let mut ex = explorer();
    ex.load_buffer(vec![1, 2]).unwrap();
    ex.set_filter("no such title");
    assert!(ex.syntax().is_empty_tree());
    assert_eq!(ex.index().len(), 1);
}

#[test]
fn filter_survives_a_new_buffer_and_keeps_selection_on_refilter() {
    let mut ex = explorer();
    ex.load_buffer(vec![0xAB]).unwrap();
    ex.focus("hdr").unwrap();
    ex.set_filter("byte 0x");
    assert_eq!(ex.selection().ranges().len(), 1);

    ex.load_buffer(vec![0xCD, 0xEF]).unwrap();
    assert_eq!(ex.filter_text(), "byte 0x");
    assert!(ex.lookup("b1").is_some());
    assert!(ex.lookup("hdr").is_none());
    // a new parse invalidates prior selections
    assert!(ex.selection().is_empty());
}

#[test]
fn parse_failure_keeps_previous_state() {
    use std::cell::Cell;
    let fail = Cell::new(false);
    let mut ex = Explorer::new(|buf: &[u8]| -> Result<DataNode, ParseError> {
        if fail.get() {
            Err(ParseError::Other("broken".into()))
        } else {
            fixed_parser(buf)
        }
    });
    ex.load_buffer(vec![1, 2, 3]).unwrap();
    ex.focus("b1").unwrap();
    let generation = ex.generation();

    fail.set(true);
    let err = ex.load_buffer(vec![9]).unwrap_err();
    assert_eq!(err, ParseError::Other("broken".into()));
    assert_eq!(ex.buffer(), &[1, 2, 3]);
    assert_eq!(ex.generation(), generation);
    assert_eq!(ex.selection().ranges().len(), 1);
    assert_eq!(ex.metrics().get("parse_error"), Some(1));

    assert!(ex.reset().is_err());
    fail.set(false);
    ex.reset().unwrap();
    assert!(ex.generation() > generation);
    assert!(ex.selection().is_empty());
}

#[test]
fn multiple_selections_use_the_palette_in_order() {
    let mut ex = explorer();
    ex.load_buffer(vec![0; 4]).unwrap();
    ex.set_selections(vec![
        BitRange::new(0, 16).unwrap(),
        BitRange::new(8, 32).unwrap(),
    ]);
    assert_eq!(ex.color_for_byte(1), Some(PRIMARY_COLOR));
    assert_eq!(ex.color_for_byte(3), Some(SECONDARY_COLOR));
    assert!(ex.clear_selection());
    assert_eq!(ex.color_for_byte(1), None);
}

#[test]
fn config_sets_palette_priority_and_hidden_flag() {
    let palette: Palette = "#FF0000,#00FF00".parse().unwrap();
    let config = ExplorerConfig::default()
        .with_palette(palette.clone())
        .with_priority(ColorPriority::LastInserted)
        .with_show_hidden_syntax(true);
    let mut ex = Explorer::with_config(fixed_parser, config);
    assert!(ex.show_hidden_syntax());
    ex.set_show_hidden_syntax(false);
    assert!(!ex.show_hidden_syntax());

    ex.load_buffer(vec![0; 2]).unwrap();
    ex.set_selections(vec![
        BitRange::new(0, 16).unwrap(),
        BitRange::new(0, 8).unwrap(),
    ]);
    assert_eq!(ex.color_for_byte(0), Some(palette.color_at(1)));
    assert_eq!(ex.selection().palette(), &palette);
}
