//! Parser error type and bounds-checked little-endian readers shared by the
//! reference formats.
use std::fmt;

/// Error returned by a [`SyntaxParser`](crate::syntax::SyntaxParser) when a
/// buffer cannot be decomposed into a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// An attempted read was outside the available buffer range.
    ///
    /// - `offset` is the byte index that was attempted to be accessed.
    /// - `needed` is the number of bytes required for the operation.
    /// - `available` is the current buffer length.
    /// - `context` names the logical field being read (for example
    ///   `"eof_offset"` or `"gd3_offset"`).
    OffsetOutOfRange {
        offset: usize,
        needed: usize,
        available: usize,
        context: Option<String>,
    },

    /// A four-byte magic did not match what the format expects.
    InvalidIdent([u8; 4]),

    /// A generic error with a human-readable message.
    Other(String),
}

impl ParseError {
    /// Attach a field name to an `OffsetOutOfRange` error. Other variants are
    /// returned unchanged.
    pub fn with_context(self, ctx: &str) -> Self {
        match self {
            ParseError::OffsetOutOfRange {
                offset,
                needed,
                available,
                ..
            } => ParseError::OffsetOutOfRange {
                offset,
                needed,
                available,
                context: Some(ctx.to_string()),
            },
            other => other,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::OffsetOutOfRange {
                offset,
                needed,
                available,
                context,
            } => {
                if let Some(ctx) = context {
                    write!(
                        f,
                        "offset out of range at {}: 0x{:X} (needed {} bytes, available {})",
                        ctx, offset, needed, available
                    )
                } else {
                    write!(
                        f,
                        "offset out of range: 0x{:X} (needed {} bytes, available {})",
                        offset, needed, available
                    )
                }
            }
            ParseError::InvalidIdent(id) => {
                write!(f, "invalid ident: '{}'", String::from_utf8_lossy(id))
            }
            ParseError::Other(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for ParseError {}

fn check_bounds(bytes: &[u8], off: usize, needed: usize) -> Result<(), ParseError> {
    match off.checked_add(needed) {
        Some(end) if end <= bytes.len() => Ok(()),
        _ => Err(ParseError::OffsetOutOfRange {
            offset: off,
            needed,
            available: bytes.len(),
            context: None,
        }),
    }
}

/// Read a 32-bit little-endian unsigned integer from `bytes` at `off`.
pub fn read_u32_le_at(bytes: &[u8], off: usize) -> Result<u32, ParseError> {
    check_bounds(bytes, off, 4)?;
    let mut tmp: [u8; 4] = [0; 4];
    tmp.copy_from_slice(&bytes[off..off + 4]);
    Ok(u32::from_le_bytes(tmp))
}

/// Read a 16-bit little-endian unsigned integer from `bytes` at `off`.
pub fn read_u16_le_at(bytes: &[u8], off: usize) -> Result<u16, ParseError> {
    check_bounds(bytes, off, 2)?;
    let mut tmp: [u8; 2] = [0; 2];
    tmp.copy_from_slice(&bytes[off..off + 2]);
    Ok(u16::from_le_bytes(tmp))
}

/// Read a single byte from `bytes` at `off`.
pub fn read_u8_at(bytes: &[u8], off: usize) -> Result<u8, ParseError> {
    check_bounds(bytes, off, 1)?;
    Ok(bytes[off])
}

/// Return a borrowed slice of length `len` starting at `off`.
pub fn read_slice(bytes: &[u8], off: usize, len: usize) -> Result<&[u8], ParseError> {
    check_bounds(bytes, off, len).map_err(|e| e.with_context("read_slice"))?;
    Ok(&bytes[off..off + len])
}
