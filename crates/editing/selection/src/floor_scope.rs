use mapcore_datatypes::{ChunkedMap, EntityId, FloorRange, Position, GROUND_FLOOR, MAX_FLOOR};

use crate::bucket::SelectionEntry;
use crate::service::SelectionService;

/// How many floors a stack-select reaches when invoked from a given starting floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionFloorScope {
    /// Only the floor the click happened on.
    CurrentFloor,
    /// Every floor from the deepest basement down to the current one.
    AllFloors,
    /// Whatever floors are visually stacked above/below the current one in the editor: the
    /// ground layer down to current when above ground, or up to two floors below current
    /// when underground.
    VisibleFloors,
}

/// Computes the descending floor range a stack-select should cover for `scope`, given the
/// floor the click originated on.
pub fn floor_range(scope: SelectionFloorScope, current_floor: u8) -> FloorRange {
    match scope {
        SelectionFloorScope::CurrentFloor => FloorRange::single(current_floor),
        SelectionFloorScope::AllFloors => FloorRange {
            start_z: i16::from(MAX_FLOOR),
            end_z:   i16::from(current_floor),
        },
        SelectionFloorScope::VisibleFloors => {
            if current_floor <= GROUND_FLOOR {
                FloorRange { start_z: i16::from(GROUND_FLOOR), end_z: i16::from(current_floor) }
            } else {
                let start = MAX_FLOOR.min(current_floor.saturating_add(2));
                FloorRange { start_z: i16::from(start), end_z: i16::from(current_floor) }
            }
        }
    }
}

/// Selects every ground and stacked item at `pos`'s `(x, y)` column across the floors
/// `scope` covers starting from `pos.z`. Used by shift-click/ctrl-shift-click stack-select
/// handlers, which all share this same floor-walking logic.
pub fn select_tile_stack_across_floors(
    map: &ChunkedMap,
    selection_service: &mut SelectionService,
    pos: Position,
    scope: SelectionFloorScope,
) {
    let range = floor_range(scope, pos.z);

    for z in range.floors() {
        let tile_pos = Position::new(pos.x, pos.y, z);
        let Some(tile) = map.get_tile(tile_pos) else { continue };

        if let Some(ground) = &tile.ground {
            selection_service.add_entity(SelectionEntry::with_item_id(
                EntityId::ground(tile_pos),
                ground.server_id,
            ));
        }
        for (index, item) in tile.items.iter().enumerate() {
            selection_service.add_entity(SelectionEntry::with_item_id(
                EntityId::item(tile_pos, index as u64),
                item.server_id,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapcore_datatypes::Item;

    #[test]
    fn current_floor_scope_covers_only_that_floor() {
        let range = floor_range(SelectionFloorScope::CurrentFloor, 6);
        assert_eq!(range.floors().collect::<Vec<_>>(), vec![6]);
    }

    #[test]
    fn all_floors_scope_runs_from_the_bottom_to_current() {
        let range = floor_range(SelectionFloorScope::AllFloors, 10);
        assert_eq!(range.start_z, 15);
        assert_eq!(range.end_z, 10);
    }

    #[test]
    fn visible_floors_scope_above_ground_starts_at_ground_layer() {
        let range = floor_range(SelectionFloorScope::VisibleFloors, 5);
        assert_eq!(range.start_z, 7);
        assert_eq!(range.end_z, 5);
    }

    #[test]
    fn visible_floors_scope_underground_looks_two_floors_down_capped_at_max() {
        let shallow = floor_range(SelectionFloorScope::VisibleFloors, 9);
        assert_eq!(shallow.start_z, 11);

        let deep = floor_range(SelectionFloorScope::VisibleFloors, 15);
        assert_eq!(deep.start_z, 15);
    }

    #[test]
    fn stack_select_picks_up_ground_and_items_on_every_covered_floor() {
        let mut map = ChunkedMap::new();
        map.get_or_create_tile(Position::new(0, 0, 7)).set_ground(Item::new(100));
        map.get_or_create_tile(Position::new(0, 0, 6)).add_item_direct(Item::new(200));

        let mut service = SelectionService::new();
        select_tile_stack_across_floors(&map, &mut service, Position::new(0, 0, 7), SelectionFloorScope::VisibleFloors);

        assert!(service.is_selected(EntityId::ground(Position::new(0, 0, 7))));
        assert!(service.is_selected(EntityId::item(Position::new(0, 0, 6), 0)));
    }
}
