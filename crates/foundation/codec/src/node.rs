use std::fs;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use log::trace;

use crate::error::CodecError;

/// Marks the start of a node: `START type_byte payload child_stream END`.
pub const START: u8 = 0xFE;
/// Marks the end of a node.
pub const END: u8 = 0xFF;
/// Precedes a literal occurrence of `START`, `END`, or itself within a node's payload or
/// child stream, so that the framing bytes stay unambiguous.
pub const ESCAPE: u8 = 0xFD;

/// Default nesting depth limit for a node tree, used unless `configurable_depth` is enabled.
pub const DEFAULT_DEPTH_LIMIT: usize = 512;

/// One node of a parsed node tree: a type byte, its own unescaped payload bytes, and the
/// list of child nodes nested inside it. Primitive reads are cursor-based and consume the
/// payload left to right; re-reading from the start requires calling [`Self::rewind`].
#[derive(Debug, Clone)]
pub struct BinaryNode {
    node_type: u8,
    payload:   Vec<u8>,
    read_pos:  usize,
    children:  Vec<BinaryNode>,
}

impl BinaryNode {
    pub fn node_type(&self) -> u8 {
        self.node_type
    }

    pub fn children(&self) -> impl Iterator<Item = &BinaryNode> {
        self.children.iter()
    }

    pub fn children_mut(&mut self) -> impl Iterator<Item = &mut BinaryNode> {
        self.children.iter_mut()
    }

    pub fn into_children(self) -> impl Iterator<Item = BinaryNode> {
        self.children.into_iter()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Resets the primitive-read cursor to the start of this node's payload.
    pub fn rewind(&mut self) {
        self.read_pos = 0;
    }

    /// Bytes remaining to be read from this node's own payload (not counting children).
    pub fn remaining(&self) -> usize {
        self.payload.len() - self.read_pos
    }

    fn take(&mut self, len: usize) -> Option<&[u8]> {
        if self.remaining() < len {
            return None;
        }
        let start = self.read_pos;
        self.read_pos += len;
        Some(&self.payload[start..self.read_pos])
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|bytes| bytes[0])
    }

    pub fn read_u16(&mut self) -> Option<u16> {
        self.take(2).map(LittleEndian::read_u16)
    }

    pub fn read_u32(&mut self) -> Option<u32> {
        self.take(4).map(LittleEndian::read_u32)
    }

    pub fn read_u64(&mut self) -> Option<u64> {
        self.take(8).map(LittleEndian::read_u64)
    }

    pub fn read_i32(&mut self) -> Option<i32> {
        self.take(4).map(LittleEndian::read_i32)
    }

    pub fn read_i64(&mut self) -> Option<i64> {
        self.take(8).map(LittleEndian::read_i64)
    }

    pub fn read_f64(&mut self) -> Option<f64> {
        self.take(8).map(LittleEndian::read_f64)
    }

    pub fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|byte| byte != 0)
    }

    /// Reads a `u16` length prefix followed by that many raw bytes, decoded as UTF-8.
    pub fn read_string(&mut self) -> Result<Option<String>, CodecError> {
        let Some(len) = self.read_u16() else { return Ok(None) };
        let Some(bytes) = self.take(len as usize) else { return Ok(None) };
        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|_| CodecError::InvalidUtf8String)
    }

    fn new(node_type: u8, payload: Vec<u8>, children: Vec<BinaryNode>) -> Self {
        Self { node_type, payload, read_pos: 0, children }
    }
}

/// A cursor over the raw, still-escaped bytes of a node stream.
struct RawCursor<'a> {
    data: &'a [u8],
    pos:  usize,
}

impl<'a> RawCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn offset(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Reads one payload byte, transparently consuming an escape byte if present.
    fn next_unescaped(&mut self) -> Result<u8, CodecError> {
        match self.next().ok_or(CodecError::UnexpectedEof)? {
            ESCAPE => self.next().ok_or(CodecError::UnexpectedEof),
            byte   => Ok(byte),
        }
    }
}

fn parse_node(cursor: &mut RawCursor<'_>, depth: usize, depth_limit: usize) -> Result<BinaryNode, CodecError> {
    if depth >= depth_limit {
        return Err(CodecError::ExceededDepthLimit { limit: depth_limit });
    }

    match cursor.next() {
        Some(START) => {}
        Some(other) => return Err(CodecError::MissingNodeStart { found: other }),
        None        => return Err(CodecError::UnexpectedEof),
    }

    let node_type = cursor.next_unescaped()?;

    let mut payload = Vec::new();
    loop {
        match cursor.peek() {
            Some(ESCAPE) => payload.push(cursor.next_unescaped()?),
            Some(START) | Some(END) => break,
            Some(_) => payload.push(cursor.next().expect("peeked byte exists")),
            None => return Err(CodecError::UnexpectedEof),
        }
    }

    let mut children = Vec::new();
    while cursor.peek() == Some(START) {
        children.push(parse_node(cursor, depth + 1, depth_limit)?);
    }

    match cursor.next() {
        Some(END) => {}
        Some(other) => return Err(CodecError::MissingNodeEnd { found: other }),
        None        => return Err(CodecError::UnexpectedEof),
    }

    Ok(BinaryNode::new(node_type, payload, children))
}

/// Reads a whole file into memory and parses its root node, after checking the leading
/// four-byte format identifier.
#[derive(Debug)]
pub struct NodeReader {
    root: BinaryNode,
    /// Total file size, for progress reporting by callers walking the tree.
    total_len: usize,
}

impl NodeReader {
    pub fn open(path: &Path, expected_identifier: [u8; 4]) -> Result<Self, CodecError> {
        let data = fs::read(path)?;
        Self::from_bytes(&data, expected_identifier)
    }

    pub fn from_bytes(data: &[u8], expected_identifier: [u8; 4]) -> Result<Self, CodecError> {
        if data.len() < 4 {
            return Err(CodecError::UnexpectedEof);
        }
        let found: [u8; 4] = [data[0], data[1], data[2], data[3]];
        if found != expected_identifier {
            return Err(CodecError::InvalidIdentifier { expected: expected_identifier, found });
        }

        let mut cursor = RawCursor::new(&data[4..]);
        let root = parse_node(&mut cursor, 0, DEFAULT_DEPTH_LIMIT)?;
        trace!("parsed root node, consumed {} of {} bytes", cursor.offset() + 4, data.len());

        Ok(Self { root, total_len: data.len() })
    }

    pub fn root(&self) -> &BinaryNode {
        &self.root
    }

    pub fn into_root(self) -> BinaryNode {
        self.root
    }

    pub fn total_len(&self) -> usize {
        self.total_len
    }
}

#[cfg(test)]
mod tests {
    use crate::writer::NodeWriter;
    use super::*;

    #[test]
    fn round_trips_nested_nodes_with_escaped_bytes() {
        let mut writer = NodeWriter::new();
        writer.begin_node(0x01);
        writer.write_u32(42);
        writer.begin_node(0xAB);
        writer.write_u8(START);
        writer.write_u16(0x1234);
        writer.write_string("tile");
        writer.end_node();
        writer.end_node();

        let mut data = b"TEST".to_vec();
        data.extend_from_slice(&writer.into_inner());

        let reader = NodeReader::from_bytes(&data, *b"TEST").unwrap();
        let mut root = reader.into_root();
        assert_eq!(root.node_type(), 0x01);
        assert_eq!(root.read_u32(), Some(42));
        assert_eq!(root.child_count(), 1);

        let mut child = root.into_children().next().unwrap();
        assert_eq!(child.node_type(), 0xAB);
        assert_eq!(child.read_u8(), Some(START));
        assert_eq!(child.read_u16(), Some(0x1234));
        assert_eq!(child.read_string().unwrap().as_deref(), Some("tile"));
    }

    #[test]
    fn rejects_wrong_identifier() {
        let mut writer = NodeWriter::new();
        writer.begin_node(0x00);
        writer.end_node();
        let mut data = b"NOPE".to_vec();
        data.extend_from_slice(&writer.into_inner());

        let err = NodeReader::from_bytes(&data, *b"TEST").unwrap_err();
        assert!(matches!(err, CodecError::InvalidIdentifier { .. }));
    }

    #[test]
    fn catches_depth_limit() {
        let mut writer = NodeWriter::new();
        for _ in 0..=DEFAULT_DEPTH_LIMIT {
            writer.begin_node(0x00);
        }
        for _ in 0..=DEFAULT_DEPTH_LIMIT {
            writer.end_node();
        }
        let mut data = b"TEST".to_vec();
        data.extend_from_slice(&writer.into_inner());

        let err = NodeReader::from_bytes(&data, *b"TEST").unwrap_err();
        assert!(matches!(err, CodecError::ExceededDepthLimit { .. }));
    }
}
