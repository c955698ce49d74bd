//! Active selections and color resolution for the raw byte/bit view.
//!
//! A [`Selection`] holds an ordered list of [`BitRange`]s. The position of a
//! range in the list picks its color from a small fixed [`Palette`]
//! (wrapping when there are more ranges than colors). Renderers ask for the
//! color of every visible bit or byte cell:
//! - [`Selection::color_for_bit`] matches ranges that contain the bit,
//! - [`Selection::color_for_byte`] matches ranges that overlap any of the
//!   byte's eight bits.
//!
//! Overlapping selections are not blended: one range wins, chosen by
//! [`ColorPriority`].
use std::fmt;
use std::str::FromStr;

use crate::range::BitRange;

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Error returned when a color string is not `#RRGGBB` / `RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError(pub String);

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color {:?} (expected #RRGGBB)", self.0)
    }
}

impl std::error::Error for ColorParseError {}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ColorParseError(s.to_string()))
        };
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Error returned when building a [`Palette`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteError {
    /// A palette needs at least one color.
    Empty,
    /// One of the entries is not a valid color.
    InvalidColor(ColorParseError),
}

impl fmt::Display for PaletteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaletteError::Empty => write!(f, "palette must contain at least one color"),
            PaletteError::InvalidColor(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PaletteError {}

impl From<ColorParseError> for PaletteError {
    fn from(e: ColorParseError) -> Self {
        PaletteError::InvalidColor(e)
    }
}

/// Primary selection color.
pub const PRIMARY_COLOR: Color = Color::rgb(0x7B, 0x1F, 0xA2);
/// Secondary selection color.
pub const SECONDARY_COLOR: Color = Color::rgb(0xBA, 0x68, 0xC8);

/// Non-empty ordered list of selection colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    pub fn new(colors: Vec<Color>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        Ok(Self { colors })
    }

    /// Color for the range at list position `index`, wrapping around.
    pub fn color_at(&self, index: usize) -> Color {
        self.colors[index % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always `false`; palettes cannot be empty.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: vec![PRIMARY_COLOR, SECONDARY_COLOR],
        }
    }
}

impl FromStr for Palette {
    type Err = PaletteError;

    /// Parse a comma separated list such as `"#7B1FA2,#BA68C8"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let colors = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Color::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Palette::new(colors)
    }
}

/// Which range wins when several active ranges match the same cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorPriority {
    /// The earliest range in the list wins.
    #[default]
    FirstInserted,
    /// The latest range in the list wins.
    LastInserted,
}

/// Ordered list of active selections plus the palette used to color them.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    ranges: Vec<BitRange>,
    palette: Palette,
    priority: ColorPriority,
    revision: u64,
}

impl Selection {
    pub fn new(palette: Palette, priority: ColorPriority) -> Self {
        Self {
            ranges: Vec::new(),
            palette,
            priority,
            revision: 0,
        }
    }

    /// Replace the active list wholesale.
    ///
    /// Returns `false` and leaves the state (and `revision`) untouched when
    /// `ranges` is structurally equal to the current list, e.g. when the node
    /// that is already the sole selection gets selected again.
    pub fn set_selections(&mut self, ranges: Vec<BitRange>) -> bool {
        if ranges == self.ranges {
            return false;
        }
        self.ranges = ranges;
        self.revision += 1;
        true
    }

    /// Drop every active range. Returns `false` when there was nothing to drop.
    pub fn clear(&mut self) -> bool {
        self.set_selections(Vec::new())
    }

    pub fn ranges(&self) -> &[BitRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Incremented on every actual change of the active list.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn priority(&self) -> ColorPriority {
        self.priority
    }

    fn find(&self, mut pred: impl FnMut(&BitRange) -> bool) -> Option<usize> {
        match self.priority {
            ColorPriority::FirstInserted => self.ranges.iter().position(&mut pred),
            ColorPriority::LastInserted => self.ranges.iter().rposition(&mut pred),
        }
    }

    /// List position of the range that colors bit `bit`.
    pub fn range_index_for_bit(&self, bit: u64) -> Option<usize> {
        self.find(|r| r.contains(bit))
    }

    /// List position of the range that colors byte `byte`. Any partial
    /// overlap with the byte's eight bits counts.
    pub fn range_index_for_byte(&self, byte: u64) -> Option<usize> {
        let cell = BitRange::byte(byte).ok()?;
        self.find(|r| r.intersect(&cell).count() > 0)
    }

    pub fn color_for_bit(&self, bit: u64) -> Option<Color> {
        self.range_index_for_bit(bit)
            .map(|i| self.palette.color_at(i))
    }

    pub fn color_for_byte(&self, byte: u64) -> Option<Color> {
        self.range_index_for_byte(byte)
            .map(|i| self.palette.color_at(i))
    }
}
