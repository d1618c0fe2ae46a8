//! A small, format-agnostic binary node codec: byte-stuffed `START type payload END` framing
//! with little-endian primitives, the wire shape used by the map codec in `mapcore-otbm`.

mod error;
mod node;
mod writer;

pub use self::error::{CodecError, NodeStructureError, StructureError};
pub use self::node::{BinaryNode, NodeReader, DEFAULT_DEPTH_LIMIT, END, ESCAPE, START};
pub use self::writer::NodeWriter;
