//! VGM (Video Game Music) file layout.
//!
//! Only the structure of the file is decoded: the main header fields, the
//! extent of the command stream and the GD3 metadata chunk. Commands
//! themselves are not interpreted.
//!
//! Offsets stored in the header are relative to the position of the field
//! that holds them (`eof_offset` at 0x04, `gd3_offset` at 0x14,
//! `loop_offset` at 0x1C, `data_offset` at 0x34).
use log::warn;

use crate::binutil::{ParseError, read_slice, read_u8_at, read_u16_le_at, read_u32_le_at};
use crate::syntax::{DataNode, SyntaxParser, path_key};

const VGM_IDENT: &[u8; 4] = b"Vgm ";
const GD3_IDENT: &[u8; 4] = b"Gd3 ";
const LEGACY_HEADER_SIZE: usize = 0x40;
/// Bit 31 of a clock field marks a secondary chip instance.
const SECONDARY_INSTANCE_FLAG: u32 = 0x8000_0000;

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Ident,
    Version,
    /// Offset relative to the field position.
    RelOffset,
    Count,
    Clock,
    Byte,
    Word,
}

#[derive(Debug, Clone, Copy)]
struct HeaderField {
    name: &'static str,
    offset: usize,
    len: usize,
    min_version: u32,
    kind: FieldKind,
}

const fn field(
    name: &'static str,
    offset: usize,
    len: usize,
    min_version: u32,
    kind: FieldKind,
) -> HeaderField {
    HeaderField {
        name,
        offset,
        len,
        min_version,
        kind,
    }
}

const HEADER_FIELDS: &[HeaderField] = &[
    field("Ident", 0x00, 4, 0, FieldKind::Ident),
    field("EOF offset", 0x04, 4, 0, FieldKind::RelOffset),
    field("Version", 0x08, 4, 0, FieldKind::Version),
    field("SN76489 clock", 0x0C, 4, 0, FieldKind::Clock),
    field("YM2413 clock", 0x10, 4, 0, FieldKind::Clock),
    field("GD3 offset", 0x14, 4, 0, FieldKind::RelOffset),
    field("Total samples", 0x18, 4, 0, FieldKind::Count),
    field("Loop offset", 0x1C, 4, 0, FieldKind::RelOffset),
    field("Loop samples", 0x20, 4, 0, FieldKind::Count),
    field("Rate", 0x24, 4, 0x101, FieldKind::Count),
    field("SN76489 feedback", 0x28, 2, 0x110, FieldKind::Word),
    field("SN76489 shift register width", 0x2A, 1, 0x110, FieldKind::Byte),
    field("SN76489 flags", 0x2B, 1, 0x151, FieldKind::Byte),
    field("YM2612 clock", 0x2C, 4, 0x110, FieldKind::Clock),
    field("YM2151 clock", 0x30, 4, 0x110, FieldKind::Clock),
    field("VGM data offset", 0x34, 4, 0x150, FieldKind::RelOffset),
];

/// Parser for `.vgm` files (decompress `.vgz` first).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VgmParser;

fn bits(offset: usize, len: usize) -> (u64, u64) {
    (offset as u64 * 8, len as u64 * 8)
}

/// Absolute file position of a relative offset field, `None` when unset.
fn absolute(field_offset: usize, value: u32) -> Option<usize> {
    if value == 0 {
        None
    } else {
        Some(field_offset.wrapping_add(value as usize))
    }
}

fn format_version(version: u32) -> String {
    format!("{:X}.{:02X}", version >> 8, version & 0xFF)
}

fn field_node(path: &[usize], f: &HeaderField, bytes: &[u8]) -> Result<DataNode, ParseError> {
    let (start, size) = bits(f.offset, f.len);
    let mut children = Vec::new();
    let title = match f.kind {
        FieldKind::Ident => {
            let raw = read_slice(bytes, f.offset, 4)?;
            format!("{}: '{}'", f.name, String::from_utf8_lossy(raw))
        }
        FieldKind::Version => {
            let v = read_u32_le_at(bytes, f.offset).map_err(|e| e.with_context(f.name))?;
            format!("{}: {}", f.name, format_version(v))
        }
        FieldKind::RelOffset => {
            let v = read_u32_le_at(bytes, f.offset).map_err(|e| e.with_context(f.name))?;
            match absolute(f.offset, v) {
                Some(abs) => format!("{}: 0x{:08X} (-> 0x{:08X})", f.name, v, abs),
                None => format!("{}: unset", f.name),
            }
        }
        FieldKind::Count => {
            let v = read_u32_le_at(bytes, f.offset).map_err(|e| e.with_context(f.name))?;
            format!("{}: {}", f.name, v)
        }
        FieldKind::Clock => {
            let v = read_u32_le_at(bytes, f.offset).map_err(|e| e.with_context(f.name))?;
            let secondary = v & SECONDARY_INSTANCE_FLAG != 0;
            // Little-endian: bit 31 is the most significant bit of the last byte.
            let mut flag_path = path.to_vec();
            flag_path.push(0);
            children.push(DataNode::new(
                path_key(&flag_path),
                format!("Secondary instance: {}", if secondary { "yes" } else { "no" }),
                (f.offset as u64 + 3) * 8,
                1,
            ));
            format!("{}: {} Hz", f.name, v & !SECONDARY_INSTANCE_FLAG)
        }
        FieldKind::Byte => {
            let v = read_u8_at(bytes, f.offset).map_err(|e| e.with_context(f.name))?;
            format!("{}: 0x{:02X}", f.name, v)
        }
        FieldKind::Word => {
            let v = read_u16_le_at(bytes, f.offset).map_err(|e| e.with_context(f.name))?;
            format!("{}: 0x{:04X}", f.name, v)
        }
    };
    let node = DataNode::new(path_key(path), title, start, size);
    if children.is_empty() {
        Ok(node)
    } else {
        Ok(node.with_children(children))
    }
}

/// GD3 metadata chunk: ident, version, data length and the string block.
fn gd3_node(path: &[usize], bytes: &[u8], start: usize) -> Option<DataNode> {
    let ident = read_slice(bytes, start, 4).ok()?;
    if ident != GD3_IDENT {
        warn!("no GD3 ident at 0x{:08X}", start);
        return None;
    }
    let version = read_u32_le_at(bytes, start + 4).ok()?;
    let declared = read_u32_le_at(bytes, start + 8).ok()? as usize;
    let data_start = start + 12;
    let data_len = declared.min(bytes.len().saturating_sub(data_start));

    let child = |i: usize, title: String, off: usize, len: usize| {
        let mut p = path.to_vec();
        p.push(i);
        let (s, n) = bits(off, len);
        DataNode::new(path_key(&p), title, s, n)
    };
    let children = vec![
        child(0, "GD3 ident: 'Gd3 '".to_string(), start, 4),
        child(
            1,
            format!("GD3 version: {}", format_version(version)),
            start + 4,
            4,
        ),
        child(2, format!("GD3 length: {}", declared), start + 8, 4),
        child(3, "GD3 strings".to_string(), data_start, data_len),
    ];
    let (s, n) = bits(start, 12 + data_len);
    Some(DataNode::new(path_key(path), "GD3", s, n).with_children(children))
}

impl SyntaxParser for VgmParser {
    fn parse(&self, bytes: &[u8]) -> Result<DataNode, ParseError> {
        let ident = read_slice(bytes, 0, 4).map_err(|e| e.with_context("ident"))?;
        if ident != VGM_IDENT {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(ident);
            return Err(ParseError::InvalidIdent(raw));
        }
        let version = read_u32_le_at(bytes, 0x08).map_err(|e| e.with_context("version"))?;
        let eof = read_u32_le_at(bytes, 0x04).map_err(|e| e.with_context("eof_offset"))?;
        let gd3 = read_u32_le_at(bytes, 0x14).map_err(|e| e.with_context("gd3_offset"))?;

        let data_offset = if version >= 0x150 {
            read_u32_le_at(bytes, 0x34).map_err(|e| e.with_context("data_offset"))?
        } else {
            0
        };
        let header_size = if data_offset == 0 {
            LEGACY_HEADER_SIZE
        } else {
            0x34 + data_offset as usize
        };
        if bytes.len() < header_size.min(LEGACY_HEADER_SIZE) {
            return Err(ParseError::OffsetOutOfRange {
                offset: 0,
                needed: LEGACY_HEADER_SIZE,
                available: bytes.len(),
                context: Some("header".into()),
            });
        }

        let mut header_children = Vec::new();
        for f in HEADER_FIELDS
            .iter()
            .filter(|f| version >= f.min_version && f.offset + f.len <= header_size)
        {
            let path = [0, 0, header_children.len()];
            header_children.push(field_node(&path, f, bytes)?);
        }
        let header_len = header_size.min(bytes.len());
        let (hs, hn) = bits(0, header_len);
        let header =
            DataNode::new(path_key(&[0, 0]), "Header", hs, hn).with_children(header_children);

        let file_end = absolute(0x04, eof)
            .map(|end| end.min(bytes.len()))
            .unwrap_or(bytes.len());
        let gd3_start = absolute(0x14, gd3).filter(|&s| s < bytes.len());
        let data_end = gd3_start.unwrap_or(file_end).max(header_len);
        let (ds, dn) = bits(header_len, data_end - header_len);
        let data = DataNode::new(
            path_key(&[0, 1]),
            format!("Data ({} bytes)", data_end - header_len),
            ds,
            dn,
        );

        let mut sections = vec![header, data];
        if let Some(node) = gd3_start.and_then(|start| gd3_node(&[0, 2], bytes, start)) {
            sections.push(node);
        }

        let (file_start, file_bits) = bits(0, bytes.len());
        let vgm = DataNode::new(
            path_key(&[0]),
            format!("VGM {}", format_version(version)),
            file_start,
            file_bits,
        )
        .with_children(sections);
        Ok(DataNode::new(path_key(&[]), "root", file_start, file_bits).with_children(vec![vgm]))
    }
}
