//! Selection state for the map editor: which entities (ground, items, creatures, spawns) are
//! currently selected, independent of any rendering or input handling.
//!
//! [`SelectionService`] is the entry point; [`bucket`] and [`snapshot`] are its storage and
//! undo/redo primitives, [`filter`] controls which entity kinds an operation touches, and
//! [`floor_scope`] covers multi-floor stack selection.

mod bucket;
mod filter;
mod floor_scope;
mod service;
mod snapshot;

pub use self::bucket::{SelectionBucket, SelectionEntry};
pub use self::filter::SelectionFilter;
pub use self::floor_scope::{floor_range, select_tile_stack_across_floors, SelectionFloorScope};
pub use self::service::{SelectionObserver, SelectionService};
pub use self::snapshot::SelectionSnapshot;
