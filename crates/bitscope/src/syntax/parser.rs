use crate::binutil::ParseError;

use super::node::DataNode;

/// Turns a raw buffer into a syntax tree.
///
/// Implementations must be deterministic for a given buffer. Node keys must
/// be unique within the returned tree; they do not need to stay the same
/// across parses. A parser is never called with an empty buffer.
pub trait SyntaxParser {
    fn parse(&self, buffer: &[u8]) -> Result<DataNode, ParseError>;
}

impl<F> SyntaxParser for F
where
    F: Fn(&[u8]) -> Result<DataNode, ParseError>,
{
    fn parse(&self, buffer: &[u8]) -> Result<DataNode, ParseError> {
        self(buffer)
    }
}
