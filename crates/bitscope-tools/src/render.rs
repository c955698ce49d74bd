//! Terminal rendering of the session state: the syntax tree as a table, and
//! hex / bit grids whose cells are colored from the active selection.
use std::sync::Arc;

use bitscope::{BitRange, Color, DataNode, Explorer, SyntaxParser};
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Titles wider than this are cut and end with `…`.
const MAX_TITLE_WIDTH: usize = 72;
const INDENT: &str = "  ";

/// One line of the tree view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub depth: usize,
    pub key: String,
    pub title: String,
    /// Inclusive byte span, `None` for zero-width nodes.
    pub bytes: Option<(u64, u64)>,
}

/// Cut `s` to at most `width` display columns (fullwidth characters count
/// as two).
fn truncate_to_width(s: &str, width: usize) -> String {
    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Flatten the tree in document order. Zero-width nodes are left out
/// unless `show_hidden` is set; their children are still listed, one level
/// up, under the nearest shown ancestor. The root is always listed.
/// `max_depth` limits how deep the walk descends.
pub fn tree_rows(root: &Arc<DataNode>, max_depth: Option<usize>, show_hidden: bool) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    let mut stack: Vec<(&Arc<DataNode>, usize)> = vec![(root, 0)];
    while let Some((node, depth)) = stack.pop() {
        let hidden = depth > 0 && !show_hidden && !node.is_selectable();
        let child_depth = if hidden {
            depth
        } else {
            rows.push(TreeRow {
                depth,
                key: node.key.clone(),
                title: node.title.clone(),
                bytes: node.byte_span(),
            });
            if max_depth.is_some_and(|max| depth >= max) {
                continue;
            }
            depth + 1
        };
        for child in node.children().iter().rev() {
            stack.push((child, child_depth));
        }
    }
    rows
}

fn byte_label(byte: Option<u64>) -> String {
    match byte {
        Some(b) => format!("0x{:08X}", b),
        None => "-".to_string(),
    }
}

/// Tree table, or a "No data" line when the root has no children.
pub fn tree_table(root: &Arc<DataNode>, max_depth: Option<usize>, show_hidden: bool) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Disabled);
    if root.children().is_empty() {
        table.add_row(vec![Cell::new("No data")]);
        return table;
    }
    table.set_header(vec!["key", "title", "first byte", "last byte"]);
    for row in tree_rows(root, max_depth, show_hidden) {
        let indented = format!("{}{}", INDENT.repeat(row.depth), row.title);
        table.add_row(vec![
            Cell::new(row.key),
            Cell::new(truncate_to_width(&indented, MAX_TITLE_WIDTH)),
            Cell::new(byte_label(row.bytes.map(|(first, _)| first))),
            Cell::new(byte_label(row.bytes.map(|(_, last)| last))),
        ]);
    }
    table
}

/// One row of the hex grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexRow {
    pub offset: usize,
    pub cells: Vec<(u8, Option<Color>)>,
    pub ascii: String,
}

fn printable(b: u8) -> char {
    if b.is_ascii_graphic() || b == b' ' {
        b as char
    } else {
        '.'
    }
}

/// Split `buffer` into rows of `bytes_per_row` and color each byte with
/// `color_for_byte`.
pub fn hex_rows(
    buffer: &[u8],
    bytes_per_row: usize,
    color_for_byte: impl Fn(u64) -> Option<Color>,
) -> Vec<HexRow> {
    buffer
        .chunks(bytes_per_row.max(1))
        .enumerate()
        .map(|(row, chunk)| {
            let offset = row * bytes_per_row.max(1);
            HexRow {
                offset,
                cells: chunk
                    .iter()
                    .enumerate()
                    .map(|(i, &b)| (b, color_for_byte((offset + i) as u64)))
                    .collect(),
                ascii: chunk.iter().map(|&b| printable(b)).collect(),
            }
        })
        .collect()
}

fn table_color(color: Color) -> comfy_table::Color {
    comfy_table::Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

fn colored(text: String, color: Option<Color>) -> Cell {
    let cell = Cell::new(text);
    match color {
        Some(c) => cell.bg(table_color(c)).fg(comfy_table::Color::White),
        None => cell,
    }
}

pub fn hex_table<P: SyntaxParser>(explorer: &Explorer<P>, bytes_per_row: usize) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Disabled);

    let mut header = vec!["offset".to_string()];
    header.extend((0..bytes_per_row.max(1)).map(|i| format!("{:02X}", i)));
    header.push("ascii".to_string());
    table.set_header(header);

    for row in hex_rows(explorer.buffer(), bytes_per_row, |b| explorer.color_for_byte(b)) {
        let mut cells = vec![Cell::new(format!("{:08X}", row.offset))];
        cells.extend(
            row.cells
                .into_iter()
                .map(|(b, color)| colored(format!("{:02X}", b), color)),
        );
        cells.push(Cell::new(row.ascii));
        table.add_row(cells);
    }
    table
}

/// Inclusive byte spans touched by any of `ranges`, clipped to the buffer,
/// sorted and with overlapping or adjacent spans merged.
pub fn covered_spans(ranges: &[BitRange], buffer_len: usize) -> Vec<(u64, u64)> {
    let Some(last_byte) = (buffer_len as u64).checked_sub(1) else {
        return Vec::new();
    };
    let mut spans: Vec<(u64, u64)> = ranges
        .iter()
        .filter_map(|r| r.byte_span())
        .filter(|&(first, _)| first <= last_byte)
        .map(|(first, last)| (first, last.min(last_byte)))
        .collect();
    spans.sort_unstable();

    let mut merged: Vec<(u64, u64)> = Vec::with_capacity(spans.len());
    for (first, last) in spans {
        match merged.last_mut() {
            Some(prev) if first <= prev.1.saturating_add(1) => prev.1 = prev.1.max(last),
            _ => merged.push((first, last)),
        }
    }
    merged
}

/// Bit grid for the bytes under the active selection, MSB first. At most
/// `max_rows` bytes are shown; the rest is summarized on a last line.
pub fn bit_table<P: SyntaxParser>(explorer: &Explorer<P>, max_rows: usize) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Disabled);

    let mut header = vec!["offset".to_string()];
    header.extend((0..8).map(|i| format!("b{}", 7 - i)));
    header.push("hex".to_string());
    table.set_header(header);

    let buffer = explorer.buffer();
    let spans = covered_spans(explorer.selection().ranges(), buffer.len());
    let total: u64 = spans.iter().map(|&(first, last)| last - first + 1).sum();
    let shown = spans
        .into_iter()
        .flat_map(|(first, last)| first..=last)
        .take(max_rows);
    for byte in shown {
        let value = buffer[byte as usize];
        let mut cells = vec![Cell::new(format!("{:08X}", byte))];
        cells.extend((0..8u64).map(|i| {
            let bit = (value >> (7 - i)) & 1;
            colored(bit.to_string(), explorer.color_for_bit(byte * 8 + i))
        }));
        cells.push(Cell::new(format!("0x{:02X}", value)));
        table.add_row(cells);
    }
    let hidden = total.saturating_sub(max_rows as u64);
    if hidden > 0 {
        table.add_row(vec![Cell::new(format!("… {} more bytes", hidden))]);
    }
    table
}

pub fn stats_table<P: SyntaxParser>(explorer: &Explorer<P>) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Disabled);

    let mut rows: Vec<(String, String)> = vec![
        ("buffer bytes".into(), explorer.buffer().len().to_string()),
        ("source nodes".into(), explorer.source_syntax().count_nodes().to_string()),
        ("view nodes".into(), explorer.index().len().to_string()),
        ("generation".into(), explorer.generation().to_string()),
        ("filter".into(), format!("{:?}", explorer.filter_text())),
    ];
    rows.extend(
        explorer
            .metrics()
            .snapshot()
            .into_iter()
            .map(|(name, value)| (format!("metrics.{}", name), value.to_string())),
    );
    for (k, v) in rows {
        table.add_row(vec![
            Cell::new(k),
            Cell::new(v).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
