//! Preview generation for brush strokes, pastes, and drags: lightweight, map-independent
//! tile data the renderer can draw before an edit is committed.
//!
//! [`PreviewProvider`] is the shared interface; [`PreviewService`] holds whichever one
//! provider is currently active (brush, paste, or drag — never more than one). Concrete
//! providers live in [`brush_providers`], [`drag`], and [`paste`].

mod brush_providers;
mod drag;
mod paste;
mod provider;
mod service;
mod types;

pub use self::brush_providers::{
    create_provider, zone_colors, BrushPreview, CreaturePreview, RawBrushPreview, SpawnPreview, ZoneBrushPreview,
};
pub use self::drag::DragPreview;
pub use self::paste::{CopyBuffer, PastePreview};
pub use self::provider::PreviewProvider;
pub use self::service::PreviewService;
pub use self::types::{Anchor, PreviewBounds, PreviewItemData, PreviewStyle, PreviewTileData, RelativePosition};
