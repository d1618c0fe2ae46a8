use mapcore_datatypes::ChunkedMap;

/// Tally of what a cleanup pass touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupResult {
    pub items_removed:  usize,
    pub tiles_affected: usize,
    pub tiles_processed: usize,
}

/// Bulk tile maintenance. The original also carries `cleanInvalidItems`/`cleanHouseItems`,
/// both of which classify items by consulting a client item-description table; no such table
/// exists anywhere in this workspace (the same gap that left `mapcore-history` and
/// `mapcore-brushes` without `ItemType`-aware behaviour), so only the id-driven removal that
/// needs no descriptor survives here.
#[derive(Debug, Default)]
pub struct MapCleanupService;

impl MapCleanupService {
    /// Removes every stacked item (ground is left alone) whose server id is in `ids`, across
    /// every tile on the map.
    pub fn remove_items_by_id(map: &mut ChunkedMap, ids: &[u16]) -> CleanupResult {
        let mut result = CleanupResult::default();

        map.for_each_tile_mut(|tile| {
            result.tiles_processed += 1;
            let before = tile.items.len();
            if tile.remove_items_if(|item| ids.contains(&item.server_id)) {
                result.items_removed += before - tile.items.len();
                result.tiles_affected += 1;
            }
        });

        result
    }
}

#[cfg(test)]
mod tests {
    use mapcore_datatypes::{Item, Position, Tile};

    use super::*;

    #[test]
    fn removes_only_matching_stacked_items() {
        let mut map = ChunkedMap::new();
        let pos = Position::new(0, 0, 7);
        let mut tile = Tile::new(pos);
        tile.set_ground(Item::new(1));
        tile.add_item_direct(Item::new(100));
        tile.add_item_direct(Item::new(200));
        map.set_tile(pos, tile);

        let result = MapCleanupService::remove_items_by_id(&mut map, &[100]);

        assert_eq!(result.items_removed, 1);
        assert_eq!(result.tiles_affected, 1);
        let tile = map.get_tile(pos).unwrap();
        assert_eq!(tile.items.len(), 1);
        assert_eq!(tile.items[0].server_id, 200);
        assert!(tile.ground.is_some());
    }

    #[test]
    fn a_clean_map_reports_nothing_removed() {
        let mut map = ChunkedMap::new();
        let pos = Position::new(0, 0, 7);
        map.set_tile(pos, Tile::new(pos));

        let result = MapCleanupService::remove_items_by_id(&mut map, &[999]);
        assert_eq!(result.items_removed, 0);
        assert_eq!(result.tiles_affected, 0);
        assert_eq!(result.tiles_processed, 1);
    }
}
