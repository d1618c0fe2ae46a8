use std::fs;
use std::io;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};

use crate::node::{END, ESCAPE, START};

/// Builds a node stream into an in-memory buffer. `begin_node`/`end_node` pairs must be
/// balanced; this is checked with a debug assertion rather than at runtime, since callers
/// are expected to be other parts of this codebase rather than untrusted input.
#[derive(Debug, Default)]
pub struct NodeWriter {
    buf:   Vec<u8>,
    depth: usize,
}

impl NodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_raw(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    fn push_escaped(&mut self, byte: u8) {
        if matches!(byte, START | END | ESCAPE) {
            self.buf.push(ESCAPE);
        }
        self.buf.push(byte);
    }

    pub fn begin_node(&mut self, node_type: u8) {
        self.push_raw(START);
        self.push_escaped(node_type);
        self.depth += 1;
    }

    pub fn end_node(&mut self) {
        debug_assert!(self.depth > 0, "end_node called without a matching begin_node");
        self.push_raw(END);
        self.depth -= 1;
    }

    pub fn write_u8(&mut self, value: u8) {
        self.push_escaped(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        let mut bytes = [0u8; 2];
        LittleEndian::write_u16(&mut bytes, value);
        bytes.iter().for_each(|&byte| self.push_escaped(byte));
    }

    pub fn write_u32(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        bytes.iter().for_each(|&byte| self.push_escaped(byte));
    }

    pub fn write_u64(&mut self, value: u64) {
        let mut bytes = [0u8; 8];
        LittleEndian::write_u64(&mut bytes, value);
        bytes.iter().for_each(|&byte| self.push_escaped(byte));
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.write_u64(value as u64);
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_u64(value.to_bits());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_u16(value.len() as u16);
        value.as_bytes().iter().for_each(|&byte| self.push_escaped(byte));
    }

    /// Consumes the writer, returning the finished (still unprefixed) node stream.
    pub fn into_inner(self) -> Vec<u8> {
        debug_assert_eq!(self.depth, 0, "node stream finished with unclosed nodes");
        self.buf
    }

    pub fn write_to(self, path: &Path, identifier: [u8; 4]) -> Result<(), io::Error> {
        let mut out = Vec::with_capacity(self.buf.len() + 4);
        out.extend_from_slice(&identifier);
        out.extend_from_slice(&self.into_inner());
        fs::write(path, out)
    }
}
