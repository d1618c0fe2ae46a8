//! Core value and container types for an in-memory tile map: positions, items, tiles,
//! chunks, creatures, and spawns. Binary/XML codecs and editing operations live in other
//! crates; this one is the data model they all share.

mod chunk;
mod creature;
mod entity;
mod item;
mod position;
mod tile;

pub use self::chunk::{Chunk, ChunkedMap, MapChangeObserver, MapVersion, TileHandle, Town, Waypoint, CHUNK_EDGE};
pub use self::creature::{Creature, Direction, Outfit, Spawn};
pub use self::entity::{EntityId, EntityType};
pub use self::item::{Item, ItemData, ItemExtension};
#[cfg(feature = "attribute_map")]
pub use self::item::AttributeValue;
pub use self::position::{FloorRange, Position, GROUND_FLOOR, MAX_FLOOR};
pub use self::tile::{Tile, TileFlags};
