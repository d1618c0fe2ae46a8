use mapcore_datatypes::{Position, Tile};

use crate::provider::PreviewProvider;
use crate::types::{Anchor, PreviewBounds, PreviewStyle, PreviewTileData, RelativePosition};

/// A cut/copied block of tiles, keyed by position relative to `origin` (the minimum corner of
/// the source selection). Owned by the clipboard service; [`PastePreview`] only borrows a
/// clone of it while a paste is in progress.
#[derive(Debug, Clone, Default)]
pub struct CopyBuffer {
    pub origin: Position,
    pub tiles:  Vec<(RelativePosition, Tile)>,
}

impl CopyBuffer {
    pub fn new(origin: Position) -> Self {
        Self { origin, tiles: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Preview for a paste operation: mirrors the copy buffer's tiles directly, with the anchor
/// following the cursor so the pasted block can be dropped anywhere.
#[derive(Debug, Default)]
pub struct PastePreview {
    anchor: Anchor,
    tiles:  Vec<PreviewTileData>,
    bounds: PreviewBounds,
}

impl PastePreview {
    pub fn new(buffer: &CopyBuffer) -> Self {
        let mut preview = Self { anchor: Anchor::default(), tiles: Vec::new(), bounds: PreviewBounds::default() };
        preview.build(buffer);
        preview
    }

    fn build(&mut self, buffer: &CopyBuffer) {
        self.tiles.clear();
        self.bounds = PreviewBounds::default();

        for (rel, tile) in &buffer.tiles {
            let mut preview_tile = PreviewTileData::new(*rel);
            if let Some(ground) = &tile.ground {
                preview_tile.add_item(ground.server_id, ground.data.count, 0.0);
            }
            for item in &tile.items {
                preview_tile.add_item(item.server_id, item.data.count, 0.0);
            }
            if let Some(creature) = &tile.creature {
                preview_tile.creature_name = Some(creature.name.clone());
            }
            if tile.spawn.is_some() {
                preview_tile.has_spawn = true;
            }

            if !preview_tile.is_empty() {
                self.bounds.expand_pos(*rel);
                self.tiles.push(preview_tile);
            }
        }
    }
}

impl PreviewProvider for PastePreview {
    fn is_active(&self) -> bool {
        !self.tiles.is_empty()
    }

    fn anchor_position(&self) -> Anchor {
        self.anchor
    }

    fn tiles(&mut self) -> &[PreviewTileData] {
        &self.tiles
    }

    fn bounds(&self) -> PreviewBounds {
        self.bounds
    }

    fn update_cursor_position(&mut self, cursor: Anchor) {
        self.anchor = cursor;
    }

    fn style(&self) -> PreviewStyle {
        PreviewStyle::Ghost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapcore_datatypes::Item;

    #[test]
    fn paste_preview_mirrors_the_copy_buffers_tiles() {
        let mut buffer = CopyBuffer::new(Position::new(10, 10, 7));
        let mut tile = Tile::new(Position::new(10, 10, 7));
        tile.set_ground(Item::new(10));
        tile.add_item_direct(Item::new(20));
        buffer.tiles.push((RelativePosition::default(), tile));

        let mut preview = PastePreview::new(&buffer);
        assert!(preview.is_active());

        let tiles = preview.tiles();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].items.len(), 2);
    }

    #[test]
    fn paste_preview_is_inactive_for_an_empty_buffer() {
        let buffer = CopyBuffer::new(Position::new(0, 0, 7));
        let preview = PastePreview::new(&buffer);
        assert!(!preview.is_active());
    }
}
