//! Per-session coordination on top of the editing primitives: clipboard copy/cut/paste,
//! multi-entity move, map-to-map merge, full-map search and cleanup, and the [`EditorSession`]
//! that bundles a map with its selection, history, and preview state.

mod clipboard;
mod cleanup;
mod editing;
mod merge;
mod search;
mod session;

pub use self::clipboard::ClipboardService;
pub use self::cleanup::{CleanupResult, MapCleanupService};
pub use self::editing::MapEditingService;
pub use self::merge::{MapMergeService, MergeOptions, MergeResult};
pub use self::search::{MapSearchMode, MapSearchResult, MapSearchService};
pub use self::session::{BrowseTileState, EditorSession, IngamePreviewState, MapInstance, MinimapState, ViewState};
