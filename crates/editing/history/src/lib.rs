//! Tile-snapshot based undo/redo for the map editor.
//!
//! [`HistoryManager`] is the entry point: callers wrap a batch of tile mutations in a
//! `begin_operation`/`end_operation` pair, and the manager captures before/after
//! [`TileSnapshot`]s (optionally LZ4-compressed, see [`compression`]) into a fixed-capacity
//! [`HistoryBuffer`] ring of [`HistoryEntry`] values.

mod buffer;
mod compression;
mod entry;
mod manager;
mod snapshot;

pub use self::buffer::{HistoryBuffer, HistoryConfig};
pub use self::entry::{ActionType, HistoryEntry};
pub use self::manager::HistoryManager;
pub use self::snapshot::{SnapshotError, TileSnapshot};
