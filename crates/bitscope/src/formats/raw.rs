//! Format-agnostic layout: the buffer split into rows, bytes and nibbles.
use crate::binutil::ParseError;
use crate::syntax::{DataNode, SyntaxParser, path_key};

/// Parser that works for any buffer.
///
/// ```text
/// root
/// └── Bitstream (N bytes)
///     ├── Row 0x00000000
///     │   ├── 0x00000000: 0x56 'V'
///     │   │   ├── High nibble: 0x5
///     │   │   └── Low nibble: 0x6
///     │   └── ...
///     └── ...
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawParser {
    bytes_per_row: usize,
}

impl Default for RawParser {
    fn default() -> Self {
        Self { bytes_per_row: 16 }
    }
}

impl RawParser {
    pub fn new(bytes_per_row: usize) -> Self {
        Self {
            bytes_per_row: bytes_per_row.max(1),
        }
    }

    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }
}

fn printable(b: u8) -> char {
    if b.is_ascii_graphic() || b == b' ' {
        b as char
    } else {
        '.'
    }
}

fn byte_node(path: &[usize], offset: usize, value: u8) -> DataNode {
    let start = offset as u64 * 8;
    let mut high = path.to_vec();
    high.push(0);
    let mut low = path.to_vec();
    low.push(1);
    DataNode::new(
        path_key(path),
        format!("0x{:08X}: 0x{:02X} '{}'", offset, value, printable(value)),
        start,
        8,
    )
    .with_children(vec![
        DataNode::new(
            path_key(&high),
            format!("High nibble: 0x{:X}", value >> 4),
            start,
            4,
        ),
        DataNode::new(
            path_key(&low),
            format!("Low nibble: 0x{:X}", value & 0x0F),
            start + 4,
            4,
        ),
    ])
}

impl SyntaxParser for RawParser {
    fn parse(&self, buffer: &[u8]) -> Result<DataNode, ParseError> {
        let total_bits = buffer.len() as u64 * 8;
        let rows: Vec<DataNode> = buffer
            .chunks(self.bytes_per_row)
            .enumerate()
            .map(|(row, chunk)| {
                let row_offset = row * self.bytes_per_row;
                let bytes = chunk
                    .iter()
                    .enumerate()
                    .map(|(i, &b)| byte_node(&[0, row, i], row_offset + i, b))
                    .collect();
                DataNode::new(
                    path_key(&[0, row]),
                    format!("Row 0x{:08X}", row_offset),
                    row_offset as u64 * 8,
                    chunk.len() as u64 * 8,
                )
                .with_children(bytes)
            })
            .collect();

        let bitstream = DataNode::new(
            path_key(&[0]),
            format!("Bitstream ({} bytes)", buffer.len()),
            0,
            total_bits,
        )
        .with_children(rows);

        Ok(DataNode::new(path_key(&[]), "root", 0, total_bits).with_children(vec![bitstream]))
    }
}
