use mapcore_datatypes::{ChunkedMap, Position};

/// How one map's tiles should be merged into another. `offset` is added directly to every
/// source coordinate, `z` included; it defaults to the zero offset on the X/Y axes and
/// [`mapcore_datatypes::GROUND_FLOOR`] on Z only because [`Position::default`] does, so
/// callers that care about floor placement should always set `offset.z` explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    pub offset:             Position,
    /// If `true`, a source tile replaces whatever's at the destination outright. If `false`,
    /// source items are appended onto the existing destination tile (ground only fills in if
    /// the destination has none) rather than discarding what's already there.
    pub overwrite_existing: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self { offset: Position::default(), overwrite_existing: false }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeResult {
    pub success:       bool,
    pub tiles_merged:  usize,
    pub tiles_skipped: usize,
}

/// Copies every non-empty tile from `source` into `target`, offset by
/// [`MergeOptions::offset`]. Tiles that would land outside the valid floor range are skipped.
#[derive(Debug, Default)]
pub struct MapMergeService;

impl MapMergeService {
    pub fn merge(target: &mut ChunkedMap, source: &ChunkedMap, options: MergeOptions) -> MergeResult {
        let mut result = MergeResult::default();

        source.for_each_tile(|tile| {
            let dest_z = i32::from(tile.position.z) + i32::from(options.offset.z);
            if !(0..=i32::from(mapcore_datatypes::MAX_FLOOR)).contains(&dest_z) {
                result.tiles_skipped += 1;
                return;
            }

            let dest_pos =
                Position::new(tile.position.x + options.offset.x, tile.position.y + options.offset.y, dest_z as u8);

            if options.overwrite_existing {
                let mut merged = tile.clone();
                merged.position = dest_pos;
                target.set_tile(dest_pos, merged);
                result.tiles_merged += 1;
                return;
            }

            match target.get_tile_mut(dest_pos) {
                None => {
                    let mut merged = tile.clone();
                    merged.position = dest_pos;
                    target.set_tile(dest_pos, merged);
                }
                Some(existing) => {
                    if existing.ground.is_none() {
                        existing.ground.clone_from(&tile.ground);
                    }
                    for item in &tile.items {
                        existing.add_item(item.clone());
                    }
                }
            }
            result.tiles_merged += 1;
        });

        result.success = true;
        result
    }
}

#[cfg(test)]
mod tests {
    use mapcore_datatypes::{Item, Tile};

    use super::*;

    fn tile_at(map: &mut ChunkedMap, pos: Position, server_id: u16) {
        let mut tile = Tile::new(pos);
        tile.set_ground(Item::new(server_id));
        map.set_tile(pos, tile);
    }

    #[test]
    fn merge_with_overwrite_replaces_the_destination_tile() {
        let mut target = ChunkedMap::new();
        tile_at(&mut target, Position::new(10, 10, 7), 1);

        let mut source = ChunkedMap::new();
        tile_at(&mut source, Position::new(0, 0, 7), 2);

        let options = MergeOptions { offset: Position::new(10, 10, 7), overwrite_existing: true };
        let result = MapMergeService::merge(&mut target, &source, options);

        assert!(result.success);
        assert_eq!(result.tiles_merged, 1);
        assert_eq!(target.get_tile(Position::new(10, 10, 7)).unwrap().ground.as_ref().unwrap().server_id, 2);
    }

    #[test]
    fn merge_without_overwrite_appends_onto_the_existing_tile() {
        let mut target = ChunkedMap::new();
        let mut existing = Tile::new(Position::new(0, 0, 7));
        existing.set_ground(Item::new(1));
        target.set_tile(Position::new(0, 0, 7), existing);

        let mut source = ChunkedMap::new();
        let mut incoming = Tile::new(Position::new(0, 0, 7));
        incoming.set_ground(Item::new(2));
        incoming.add_item_direct(Item::new(300));
        source.set_tile(Position::new(0, 0, 7), incoming);

        let options = MergeOptions { offset: Position::new(0, 0, 7), overwrite_existing: false };
        let result = MapMergeService::merge(&mut target, &source, options);

        assert_eq!(result.tiles_merged, 1);
        let merged = target.get_tile(Position::new(0, 0, 7)).unwrap();
        assert_eq!(merged.ground.as_ref().unwrap().server_id, 1);
        assert_eq!(merged.items.len(), 1);
    }

    #[test]
    fn merge_skips_tiles_that_would_land_off_the_floor_range() {
        let mut target = ChunkedMap::new();
        let mut source = ChunkedMap::new();
        tile_at(&mut source, Position::new(0, 0, 15), 1);

        let options = MergeOptions { offset: Position::new(0, 0, 5), overwrite_existing: true };
        let result = MapMergeService::merge(&mut target, &source, options);

        assert_eq!(result.tiles_merged, 0);
        assert_eq!(result.tiles_skipped, 1);
    }
}
