use std::collections::HashMap;

use mapcore_datatypes::{ChunkedMap, Creature, EntityId, EntityType, Item, Position, Spawn};
use mapcore_history::{ActionType, HistoryManager};
use mapcore_selection::{SelectionEntry, SelectionService};

struct PendingItemMove {
    from:      Position,
    to:        Position,
    item:      Item,
    is_ground: bool,
}

struct PendingCreatureMove {
    from:     Position,
    to:       Position,
    creature: Creature,
}

struct PendingSpawnMove {
    from:  Position,
    to:    Position,
    spawn: Spawn,
}

/// An entity that was actually relocated, recorded so the selection can follow it to its new
/// position. Unlike the original (which keys the new selection entry off the moved object's
/// address), there's no stable pointer to reuse in Rust: an item's `local_id` here is instead
/// the index it landed at in the destination tile's stack, computed once every insertion for
/// that tile has happened.
struct MovedEntity {
    position:    Position,
    entity_type: EntityType,
    local_id:    u64,
}

#[derive(Default)]
struct MoveContext {
    pending_items:     Vec<PendingItemMove>,
    pending_creatures: Vec<PendingCreatureMove>,
    pending_spawns:    Vec<PendingSpawnMove>,
    moved:             Vec<MovedEntity>,
}

/// Two-phase move: every selected entity is first extracted from its source tile (phase one),
/// then reinserted at its destination (phase two). Doing all extraction before any insertion
/// means moving a tile's contents onto an adjacent tile that's also moving can't clobber
/// items that haven't been read yet.
#[derive(Debug, Default)]
pub struct MapEditingService;

impl MapEditingService {
    /// Moves every selected entity by `(dx, dy)`, recording the whole operation as one undo
    /// step. Returns `false` (and records nothing) if there's nothing selected or the offset
    /// is zero.
    pub fn move_items(
        map: &mut ChunkedMap,
        selection: &mut SelectionService,
        history: &mut HistoryManager,
        dx: i32,
        dy: i32,
    ) -> bool {
        if selection.is_empty() || (dx == 0 && dy == 0) {
            return false;
        }

        let entries = selection.all_entries();

        history.begin_operation("Move items", ActionType::Other, Some(selection));
        Self::collect_affected_tiles(&entries, dx, dy, map, history);

        let mut ctx = MoveContext::default();
        Self::extract_movables(&entries, dx, dy, map, &mut ctx);
        Self::insert_movables(map, &mut ctx);

        let has_moves = !ctx.moved.is_empty();
        if has_moves {
            history.end_operation(map, Some(selection));
            Self::update_selection_after_move(selection, &ctx);
            true
        } else {
            history.cancel_operation();
            false
        }
    }

    fn collect_affected_tiles(
        entries: &[SelectionEntry],
        dx: i32,
        dy: i32,
        map: &ChunkedMap,
        history: &mut HistoryManager,
    ) {
        let mut affected = Vec::new();
        for entry in entries {
            let from = entry.position();
            let to = from.offset(dx, dy);
            if !affected.contains(&from) {
                affected.push(from);
            }
            if !affected.contains(&to) {
                affected.push(to);
            }
        }

        for pos in affected {
            history.record_tile_before(pos, map.get_tile(pos));
        }
    }

    fn extract_movables(entries: &[SelectionEntry], dx: i32, dy: i32, map: &mut ChunkedMap, ctx: &mut MoveContext) {
        let mut items_by_tile: HashMap<Position, Vec<(u64, bool, Position)>> = HashMap::new();
        let mut creature_moves = Vec::new();
        let mut spawn_moves = Vec::new();

        for entry in entries {
            let from = entry.position();
            let to = from.offset(dx, dy);

            match entry.id.entity_type {
                EntityType::Ground => {
                    items_by_tile.entry(from).or_default().push((0, true, to));
                }
                EntityType::Item => {
                    items_by_tile.entry(from).or_default().push((entry.id.local_id, false, to));
                }
                EntityType::Creature => creature_moves.push((from, to)),
                EntityType::Spawn => spawn_moves.push((from, to)),
            }
        }

        // Phase one: extract. Stacked items are removed back-to-front so earlier indices in
        // the same tile stay valid as later removals happen.
        for (from, mut moves) in items_by_tile {
            let Some(tile) = map.get_tile_mut(from) else { continue };

            let ground_move = moves.iter().position(|(_, is_ground, _)| *is_ground).map(|i| moves.remove(i));
            if let Some((_, _, to)) = ground_move {
                if let Some(ground) = tile.ground.take() {
                    ctx.pending_items.push(PendingItemMove { from, to, item: ground, is_ground: true });
                }
            }

            moves.sort_by(|a, b| b.0.cmp(&a.0));
            for (local_id, _, to) in moves {
                let idx = local_id as usize;
                if idx < tile.items.len() {
                    let item = tile.items.remove(idx);
                    ctx.pending_items.push(PendingItemMove { from, to, item, is_ground: false });
                }
            }
        }

        for (from, to) in creature_moves {
            if let Some(tile) = map.get_tile_mut(from) {
                if let Some(creature) = tile.creature.take() {
                    ctx.pending_creatures.push(PendingCreatureMove { from, to, creature });
                }
            }
        }

        for (from, to) in spawn_moves {
            let taken = map.get_tile_mut(from).and_then(|mut tile| tile.spawn.take());
            if let Some(spawn) = taken {
                map.notify_spawn_change(from, false);
                ctx.pending_spawns.push(PendingSpawnMove { from, to, spawn });
            }
        }
    }

    fn insert_movables(map: &mut ChunkedMap, ctx: &mut MoveContext) {
        for pending in ctx.pending_items.drain(..) {
            let to_tile = map.get_or_create_tile(pending.to);
            if pending.is_ground {
                to_tile.set_ground(pending.item);
                ctx.moved.push(MovedEntity { position: pending.to, entity_type: EntityType::Ground, local_id: 0 });
            } else {
                to_tile.add_item(pending.item);
                let local_id = (to_tile.items.len().max(1) - 1) as u64;
                ctx.moved.push(MovedEntity { position: pending.to, entity_type: EntityType::Item, local_id });
            }
        }

        for pending in ctx.pending_creatures.drain(..) {
            let to_tile = map.get_or_create_tile(pending.to);
            if to_tile.creature.is_none() {
                to_tile.creature = Some(pending.creature);
                ctx.moved.push(MovedEntity { position: pending.to, entity_type: EntityType::Creature, local_id: 0 });
            }
        }

        for mut pending in ctx.pending_spawns.drain(..) {
            let to_tile = map.get_or_create_tile(pending.to);
            if to_tile.spawn.is_none() {
                pending.spawn.center = pending.to;
                to_tile.spawn = Some(pending.spawn);
                map.notify_spawn_change(pending.to, true);
                ctx.moved.push(MovedEntity { position: pending.to, entity_type: EntityType::Spawn, local_id: 0 });
            }
        }
    }

    fn update_selection_after_move(selection: &mut SelectionService, ctx: &MoveContext) {
        selection.clear();
        for moved in &ctx.moved {
            let id = EntityId::new(moved.position, moved.entity_type, moved.local_id);
            selection.add_entity(SelectionEntry::new(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use mapcore_datatypes::Tile;
    use mapcore_history::HistoryConfig;

    use super::*;

    fn history() -> HistoryManager {
        HistoryManager::new(HistoryConfig::default())
    }

    #[test]
    fn moving_nothing_selected_does_nothing() {
        let mut map = ChunkedMap::new();
        let mut selection = SelectionService::new();
        let mut hist = history();
        assert!(!MapEditingService::move_items(&mut map, &mut selection, &mut hist, 1, 0));
    }

    #[test]
    fn moving_a_tile_relocates_its_contents_and_selection() {
        let mut map = ChunkedMap::new();
        let from = Position::new(5, 5, 7);
        let to = Position::new(6, 5, 7);

        let mut tile = Tile::new(from);
        tile.set_ground(Item::new(100));
        tile.add_item_direct(Item::new(200));
        map.set_tile(from, tile);

        let mut selection = SelectionService::new();
        selection.select_tile(&map, from);
        let mut hist = history();

        assert!(MapEditingService::move_items(&mut map, &mut selection, &mut hist, 1, 0));

        assert!(map.get_tile(from).is_none_or(|t| t.is_empty()));
        let moved = map.get_tile(to).unwrap();
        assert_eq!(moved.ground.as_ref().unwrap().server_id, 100);
        assert_eq!(moved.items.len(), 1);

        assert!(!selection.is_empty());
        for entry in selection.all_entries() {
            assert_eq!(entry.position(), to);
        }
    }

    #[test]
    fn moving_a_spawn_updates_its_center() {
        let mut map = ChunkedMap::new();
        let from = Position::new(0, 0, 7);
        let to = Position::new(0, 1, 7);

        let mut tile = Tile::new(from);
        tile.spawn = Some(Spawn::new(from, 3));
        map.set_tile(from, tile);

        let mut selection = SelectionService::new();
        selection.select_tile(&map, from);
        let mut hist = history();

        assert!(MapEditingService::move_items(&mut map, &mut selection, &mut hist, 0, 1));

        let moved = map.get_tile(to).unwrap().spawn.as_ref().unwrap();
        assert_eq!(moved.center, to);
    }
}
