use mapcore_datatypes::{ChunkedMap, EntityType, Position};
use mapcore_selection::SelectionService;

use crate::provider::PreviewProvider;
use crate::types::{Anchor, PreviewBounds, PreviewStyle, PreviewTileData, RelativePosition};

/// Preview for a drag-move: extracts the selected entities' current map content once at drag
/// start, then tracks the cursor as the anchor while the extracted content stays fixed
/// relative to it.
#[derive(Debug, Default)]
pub struct DragPreview {
    drag_start: Position,
    current:    Anchor,
    tiles:      Vec<PreviewTileData>,
    bounds:     PreviewBounds,
    active:     bool,
}

impl DragPreview {
    /// Builds a drag preview from every entity currently selected in `selection`, reading
    /// their content off `map` as it stands at `drag_start`.
    pub fn new(selection: &SelectionService, map: &ChunkedMap, drag_start: Position) -> Self {
        let mut preview =
            Self { drag_start, current: drag_start, tiles: Vec::new(), bounds: PreviewBounds::default(), active: !selection.is_empty() };
        preview.build(selection, map);
        preview
    }

    fn relative(&self, pos: Position) -> RelativePosition {
        RelativePosition::new(pos.x - self.drag_start.x, pos.y - self.drag_start.y, i32::from(pos.z) - i32::from(self.drag_start.z))
    }

    fn tile_at_mut(&mut self, rel: RelativePosition) -> &mut PreviewTileData {
        if let Some(index) = self.tiles.iter().position(|t| t.relative_position == rel) {
            return &mut self.tiles[index];
        }
        self.tiles.push(PreviewTileData::new(rel));
        self.tiles.last_mut().expect("just pushed")
    }

    fn build(&mut self, selection: &SelectionService, map: &ChunkedMap) {
        self.tiles.clear();
        self.bounds = PreviewBounds::default();

        if selection.is_empty() {
            return;
        }

        for entry in selection.all_entries() {
            let pos = entry.position();
            let rel = self.relative(pos);

            match entry.id.entity_type {
                EntityType::Ground => {
                    let Some(tile) = map.get_tile(pos) else { continue };
                    let mut preview_tile = PreviewTileData::new(rel);
                    if let Some(ground) = &tile.ground {
                        preview_tile.add_item(ground.server_id, ground.data.count, 0.0);
                    }
                    for item in &tile.items {
                        preview_tile.add_item(item.server_id, item.data.count, 0.0);
                    }
                    if !preview_tile.is_empty() {
                        self.tiles.push(preview_tile);
                    }
                }
                EntityType::Item => {
                    let Some(tile) = map.get_tile(pos) else { continue };
                    let local_id = entry.id.local_id as usize;
                    let Some(item) = tile.items.get(local_id) else { continue };
                    self.tile_at_mut(rel).add_item(item.server_id, item.data.count, 0.0);
                }
                EntityType::Creature => {
                    let Some(tile) = map.get_tile(pos) else { continue };
                    let Some(creature) = &tile.creature else { continue };
                    self.tile_at_mut(rel).creature_name = Some(creature.name.clone());
                }
                EntityType::Spawn => {
                    self.tile_at_mut(rel).has_spawn = true;
                }
            }
        }

        for tile in &self.tiles {
            self.bounds.expand_pos(tile.relative_position);
        }
    }
}

impl PreviewProvider for DragPreview {
    fn is_active(&self) -> bool {
        self.active && !self.tiles.is_empty()
    }

    fn anchor_position(&self) -> Anchor {
        self.current
    }

    fn tiles(&mut self) -> &[PreviewTileData] {
        &self.tiles
    }

    fn bounds(&self) -> PreviewBounds {
        self.bounds
    }

    fn update_cursor_position(&mut self, cursor: Anchor) {
        self.current = cursor;
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
    fn drag_preview_is_inactive_with_nothing_selected() {
        let map = ChunkedMap::new();
        let selection = SelectionService::new();
        let preview = DragPreview::new(&selection, &map, Position::new(0, 0, 7));
        assert!(!preview.is_active());
    }

    #[test]
    fn drag_preview_carries_ground_and_items_relative_to_the_start() {
        let mut map = ChunkedMap::new();
        let pos = Position::new(5, 5, 7);
        let tile = map.get_or_create_tile(pos);
        tile.set_ground(Item::new(100));
        tile.add_item_direct(Item::new(200));

        let mut selection = SelectionService::new();
        selection.select_tile(&map, pos);

        let mut preview = DragPreview::new(&selection, &map, pos);
        assert!(preview.is_active());

        let tiles = preview.tiles();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].relative_position, RelativePosition::default());
        assert_eq!(tiles[0].items.len(), 2);
    }

    #[test]
    fn drag_preview_follows_the_cursor_independent_of_the_drag_start() {
        let map = ChunkedMap::new();
        let selection = SelectionService::new();
        let mut preview = DragPreview::new(&selection, &map, Position::new(0, 0, 7));

        preview.update_cursor_position(Position::new(10, 10, 7));
        assert_eq!(preview.anchor_position(), Position::new(10, 10, 7));
    }
}
