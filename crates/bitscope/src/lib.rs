#![doc = include_str!("../README.md")]
//! bitscope: bit-range overlay engine for binary-format inspectors
//!
//! The pieces sit between a format parser and a renderer: the parser
//! produces a [`DataNode`] tree, the [`Explorer`] session filters and
//! indexes it, and the renderer asks the session for the color of each
//! bit or byte cell.
//!
//! Example
//!
//! ```rust
//! use bitscope::explorer::{Explorer, Focus};
//! use bitscope::formats::RawParser;
//! use bitscope::selection::PRIMARY_COLOR;
//!
//! let mut explorer = Explorer::new(RawParser::new(4));
//! explorer.load_buffer(vec![0x56, 0x67, 0x6D, 0x20, 0x51, 0x01]).unwrap();
//!
//! // Search rows by label; ancestors of matches are kept.
//! explorer.set_filter("row 0x00000004");
//! assert_eq!(explorer.syntax().children()[0].children().len(), 1);
//!
//! // Focus the third byte (key "0.0.2") of the unfiltered tree.
//! explorer.set_filter("");
//! let focus = explorer.focus("0.0.2").unwrap();
//! assert!(matches!(focus, Focus::Selected(_)));
//! assert_eq!(explorer.color_for_byte(2), Some(PRIMARY_COLOR));
//! assert_eq!(explorer.color_for_byte(1), None);
//! ```
pub mod binutil;
pub mod explorer;
pub mod formats;
pub mod metrics;
pub mod range;
pub mod selection;
pub mod syntax;

pub use binutil::ParseError;
pub use explorer::{Explorer, ExplorerConfig, Focus, IgnoreReason};
pub use range::{BitRange, RangeError};
pub use selection::{Color, ColorPriority, Palette, Selection};
pub use syntax::{DataNode, Generation, LookupMiss, SyntaxIndex, SyntaxParser};
