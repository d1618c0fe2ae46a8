//! Reader and writer for the binary tile-map container format, plus its sidecar spawn/house
//! XML schemas.
//!
//! Individual node/entity parsers live in their own modules ([`tile_io`], [`item_io`],
//! [`entities_io`]) behind the [`MapBuilder`] seam in [`builder`]; [`read`] and [`write`]
//! only orchestrate the top-level file structure.

mod builder;
mod entities_io;
mod error;
mod item_io;
mod node_types;
mod read;
mod tile_io;
mod write;
mod xml;

pub use self::builder::{ChunkedMapBuilder, MapBuilder};
pub use self::error::{OtbmError, ReadStats};
pub use self::node_types::FILE_IDENTIFIER;
pub use self::read::{read_header, read_map, MapHeader};
pub use self::write::write_map;
pub use self::xml::{read_houses_xml, read_spawns_xml, write_houses_xml, write_spawns_xml, HouseXml};
