use std::collections::HashMap;

use mapcore_datatypes::{ChunkedMap, EntityType, Position, Tile};
use mapcore_preview::{CopyBuffer, PastePreview, RelativePosition};
use mapcore_selection::{SelectionEntry, SelectionService};

fn relative(pos: Position, origin: Position) -> RelativePosition {
    RelativePosition::new(pos.x - origin.x, pos.y - origin.y, i32::from(pos.z) - i32::from(origin.z))
}

/// Copy/cut/paste over a [`ChunkedMap`]'s selection. Paste never touches the map directly:
/// it hands the buffer to a [`PastePreview`] and lets the caller commit it through the usual
/// preview-to-edit path, so a pending paste can still be moved or cancelled.
#[derive(Debug, Default)]
pub struct ClipboardService {
    buffer: CopyBuffer,
}

impl ClipboardService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the current selection into the clipboard buffer, returning the number of tiles
    /// copied. If any entity-level selection entries exist (an individual item, ground,
    /// creature, or spawn), only those specific entities are copied; otherwise whole tiles are
    /// copied.
    pub fn copy(&mut self, map: &ChunkedMap, selection: &SelectionService) -> usize {
        if selection.is_empty() {
            return 0;
        }

        let origin = selection.min_bound();
        let entries = selection.all_entries();
        let has_entity_entries = entries.iter().any(|e| {
            matches!(e.id.entity_type, EntityType::Item | EntityType::Ground | EntityType::Creature | EntityType::Spawn)
        });

        let mut tiles = Vec::new();

        if has_entity_entries {
            let mut by_position: HashMap<Position, Vec<SelectionEntry>> = HashMap::new();
            for entry in entries {
                by_position.entry(entry.position()).or_default().push(entry);
            }

            for (pos, group) in by_position {
                let Some(source) = map.get_tile(pos) else { continue };
                let mut partial = Tile::new(pos);
                for entry in group {
                    match entry.id.entity_type {
                        EntityType::Ground => {
                            if let Some(ground) = &source.ground {
                                partial.set_ground(ground.clone());
                            }
                        }
                        EntityType::Item => {
                            if let Some(item) = source.items.get(entry.id.local_id as usize) {
                                partial.add_item_direct(item.clone());
                            }
                        }
                        EntityType::Creature => {
                            partial.creature.clone_from(&source.creature);
                        }
                        EntityType::Spawn => {
                            partial.spawn.clone_from(&source.spawn);
                        }
                    }
                }
                if !partial.is_empty() {
                    tiles.push((relative(pos, origin), partial));
                }
            }
        } else {
            for pos in selection.positions() {
                if let Some(tile) = map.get_tile(pos) {
                    tiles.push((relative(pos, origin), tile.clone()));
                }
            }
        }

        self.buffer = CopyBuffer { origin, tiles };
        self.buffer.tiles.len()
    }

    /// Copies the selection, then removes it from the map. Mirrors [`Self::copy`]'s
    /// entity-vs-tile split, but only item/ground entries trigger entity-level removal — a
    /// selection of only creatures or spawns falls back to removing whole tiles.
    pub fn cut(&mut self, map: &mut ChunkedMap, selection: &mut SelectionService) -> usize {
        let count = self.copy(map, selection);
        if count == 0 {
            return 0;
        }

        let entries = selection.all_entries();
        let has_entity_entries =
            entries.iter().any(|e| matches!(e.id.entity_type, EntityType::Item | EntityType::Ground));

        if has_entity_entries {
            for entry in entries {
                if entry.id.entity_type != EntityType::Item && entry.id.entity_type != EntityType::Ground {
                    continue;
                }
                if let Some(tile) = map.get_tile_mut(entry.position()) {
                    match entry.id.entity_type {
                        EntityType::Ground => tile.ground = None,
                        EntityType::Item => {
                            let idx = entry.id.local_id as usize;
                            if idx < tile.items.len() {
                                tile.items.remove(idx);
                            }
                        }
                        EntityType::Creature | EntityType::Spawn => unreachable!(),
                    }
                }
            }
        } else {
            for pos in selection.positions() {
                map.remove_tile(pos);
            }
        }

        selection.clear();
        count
    }

    /// Builds a [`PastePreview`] mirroring the buffer's current contents, anchored wherever
    /// the caller places it. Unlike copy/cut, paste itself never mutates the map — the preview
    /// is committed (or cancelled) through the ordinary preview-to-edit path.
    pub fn paste_preview(&self) -> PastePreview {
        PastePreview::new(&self.buffer)
    }

    pub fn can_paste(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn width(&self) -> i32 {
        self.extent(|rel| rel.x)
    }

    pub fn height(&self) -> i32 {
        self.extent(|rel| rel.y)
    }

    fn extent(&self, axis: impl Fn(RelativePosition) -> i32) -> i32 {
        let (mut min, mut max) = (0, 0);
        for (rel, _) in &self.buffer.tiles {
            min = min.min(axis(*rel));
            max = max.max(axis(*rel));
        }
        max - min + 1
    }
}

#[cfg(test)]
mod tests {
    use mapcore_datatypes::{Item, Position};

    use super::*;

    fn selected_map() -> (ChunkedMap, SelectionService) {
        let mut map = ChunkedMap::new();
        let pos = Position::new(5, 5, 7);
        let mut tile = Tile::new(pos);
        tile.set_ground(Item::new(100));
        tile.add_item_direct(Item::new(200));
        map.set_tile(pos, tile);

        let mut selection = SelectionService::new();
        selection.select_tile(&map, pos);
        (map, selection)
    }

    #[test]
    fn copying_an_empty_selection_copies_nothing() {
        let map = ChunkedMap::new();
        let selection = SelectionService::new();
        let mut clipboard = ClipboardService::new();
        assert_eq!(clipboard.copy(&map, &selection), 0);
        assert!(!clipboard.can_paste());
    }

    #[test]
    fn copy_captures_the_full_selected_tile() {
        let (map, selection) = selected_map();
        let mut clipboard = ClipboardService::new();
        assert_eq!(clipboard.copy(&map, &selection), 1);
        assert!(clipboard.can_paste());

        let preview = clipboard.paste_preview();
        assert!(mapcore_preview::PreviewProvider::is_active(&preview));
    }

    #[test]
    fn cut_removes_the_tile_and_clears_the_selection() {
        let (mut map, mut selection) = selected_map();
        let mut clipboard = ClipboardService::new();
        assert_eq!(clipboard.cut(&mut map, &mut selection), 1);

        assert!(selection.is_empty());
        assert!(map.get_tile(Position::new(5, 5, 7)).is_none());
        assert!(clipboard.can_paste());
    }
}
