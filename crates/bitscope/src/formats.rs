//! Reference parsers.
//!
//! - [`raw::RawParser`] lays out any buffer as rows, bytes and nibbles.
//! - [`vgm::VgmParser`] decodes the structure of VGM sound logs.
pub mod raw;
pub mod vgm;

pub use raw::RawParser;
pub use vgm::VgmParser;
