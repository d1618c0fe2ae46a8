use crate::types::{Anchor, PreviewBounds, PreviewStyle, PreviewTileData};

/// Generates preview tiles for one active editing context: a brush, a paste, or a drag.
/// Implementations are swapped wholesale by [`crate::PreviewService`] as that context changes.
pub trait PreviewProvider {
    /// Whether [`Self::tiles`] currently returns meaningful data.
    fn is_active(&self) -> bool;

    /// The world position this preview is anchored to, usually the cursor tile. Every tile
    /// returned by [`Self::tiles`] is relative to this.
    fn anchor_position(&self) -> Anchor;

    /// All preview tiles, relative to the anchor.
    fn tiles(&mut self) -> &[PreviewTileData];

    /// Bounding box of every tile returned by [`Self::tiles`], relative to the anchor.
    fn bounds(&self) -> PreviewBounds;

    /// Called every time the cursor moves over the viewport.
    fn update_cursor_position(&mut self, cursor: Anchor);

    /// Rendering hint. Defaults to [`PreviewStyle::Ghost`].
    fn style(&self) -> PreviewStyle {
        PreviewStyle::Ghost
    }

    /// Whether brush/settings changes since the last [`Self::tiles`] call require rebuilding.
    /// Defaults to `false` for providers whose content never depends on external parameters.
    fn needs_regeneration(&self) -> bool {
        false
    }

    /// Rebuilds preview tiles from current parameters. Called when brush size/shape changes.
    fn regenerate(&mut self) {}
}
