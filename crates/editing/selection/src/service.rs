use std::rc::Weak;

use mapcore_datatypes::{ChunkedMap, EntityId, Position, Tile};

use crate::bucket::{SelectionBucket, SelectionEntry};
use crate::filter::SelectionFilter;
use crate::snapshot::SelectionSnapshot;

/// Reacts to selection changes: UI overlays, status-bar counts, and the like.
///
/// Held by weak reference, matching [`mapcore_datatypes::MapChangeObserver`]'s lifetime
/// contract: a dropped observer is skipped on the next notification rather than requiring
/// explicit unregistration.
pub trait SelectionObserver {
    /// Called once per public mutating operation with the entries it added and removed.
    fn on_selection_changed(&self, added: &[SelectionEntry], removed: &[SelectionEntry]) {
        let _ = (added, removed);
    }

    /// Called instead of `on_selection_changed` when the whole selection was cleared at
    /// once, so observers can reset rather than walk a removal list the size of the old
    /// selection.
    fn on_selection_cleared(&self) {}
}

/// Central service for all selection operations: unified entry points for click/drag/lasso
/// selection, granular entity-level add/remove/toggle, snapshotting for undo/redo, and an
/// observer hook for reactive UI. Holds selection state only; it never touches rendering or
/// input handling.
#[derive(Default)]
pub struct SelectionService {
    bucket:    SelectionBucket,
    observers: Vec<Weak<dyn SelectionObserver>>,
}

impl SelectionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_observer(&mut self, observer: &std::rc::Rc<dyn SelectionObserver>) {
        self.observers.push(std::rc::Rc::downgrade(observer));
    }

    fn notify_changed(&mut self, added: &[SelectionEntry], removed: &[SelectionEntry]) {
        if added.is_empty() && removed.is_empty() {
            return;
        }
        self.observers.retain(|observer| {
            observer.upgrade().inspect(|o| o.on_selection_changed(added, removed)).is_some()
        });
    }

    fn notify_cleared(&mut self) {
        self.observers.retain(|observer| {
            observer.upgrade().inspect(|o| o.on_selection_cleared()).is_some()
        });
    }

    /// Builds the entries present on `tile` that `filter` admits. The ground slot's and
    /// creature's and spawn's local id is always 0 (at most one each per tile); each stacked
    /// item's local id is its index within the tile's item stack, which is stable for as
    /// long as the tile isn't mutated — good enough for the lifetime of one selection, and
    /// the only option available without raw pointer identity.
    fn tile_entries(pos: Position, tile: &Tile, filter: &SelectionFilter) -> Vec<SelectionEntry> {
        let mut entries = Vec::new();

        if let Some(ground) = &tile.ground {
            let id = EntityId::ground(pos);
            if filter.matches(id) {
                entries.push(SelectionEntry::with_item_id(id, ground.server_id));
            }
        }
        for (index, item) in tile.items.iter().enumerate() {
            let id = EntityId::item(pos, index as u64);
            if filter.matches(id) {
                entries.push(SelectionEntry::with_item_id(id, item.server_id));
            }
        }
        if tile.creature.is_some() {
            let id = EntityId::creature(pos);
            if filter.matches(id) {
                entries.push(SelectionEntry::new(id));
            }
        }
        if tile.spawn.is_some() {
            let id = EntityId::spawn(pos);
            if filter.matches(id) {
                entries.push(SelectionEntry::new(id));
            }
        }

        entries
    }

    /// Picks the single highest-priority entity on `tile` that `filter` admits: a spawn
    /// first, then a creature, then the topmost stacked item, then ground as a last resort.
    /// Mirrors a context-sensitive click, which grabs one thing under the cursor rather than
    /// the whole tile.
    fn single_entry(pos: Position, tile: &Tile, filter: &SelectionFilter) -> Option<SelectionEntry> {
        if tile.spawn.is_some() {
            let id = EntityId::spawn(pos);
            if filter.matches(id) {
                return Some(SelectionEntry::new(id));
            }
        }
        if tile.creature.is_some() {
            let id = EntityId::creature(pos);
            if filter.matches(id) {
                return Some(SelectionEntry::new(id));
            }
        }
        if let Some((index, item)) = tile.items.iter().enumerate().last() {
            let id = EntityId::item(pos, index as u64);
            if filter.matches(id) {
                return Some(SelectionEntry::with_item_id(id, item.server_id));
            }
        }
        if let Some(ground) = &tile.ground {
            let id = EntityId::ground(pos);
            if filter.matches(id) {
                return Some(SelectionEntry::with_item_id(id, ground.server_id));
            }
        }
        None
    }

    /// Adds every entity on `tile` that `filter` admits, notifying once for the whole tile.
    pub fn add_tile_entities(&mut self, pos: Position, tile: &Tile, filter: &SelectionFilter) {
        let candidates = Self::tile_entries(pos, tile, filter);
        let mut added = Vec::new();
        for entry in candidates {
            if !self.bucket.contains(entry.id) {
                self.bucket.add(entry);
                added.push(entry);
            }
        }
        self.notify_changed(&added, &[]);
    }

    /// Selects the entities at `pos` admitted by `filter`, optionally clearing the existing
    /// selection first.
    pub fn select_at(&mut self, map: &ChunkedMap, pos: Position, filter: &SelectionFilter, clear_first: bool) {
        if clear_first {
            self.clear();
        }
        let Some(tile) = map.get_tile(pos) else { return };
        self.add_tile_entities(pos, tile, filter);
    }

    /// Selects at most one entity at `pos`, chosen by [`Self::single_entry`]'s priority
    /// order (spawn, then creature, then the topmost item, then ground), optionally clearing
    /// the existing selection first. A no-op if `pos` has no tile or nothing on it survives
    /// `filter`.
    pub fn select_single_at(&mut self, map: &ChunkedMap, pos: Position, filter: &SelectionFilter, clear_first: bool) {
        if clear_first {
            self.clear();
        }
        let Some(tile) = map.get_tile(pos) else { return };
        let Some(entry) = Self::single_entry(pos, tile, filter) else { return };
        if !self.bucket.contains(entry.id) {
            self.bucket.add(entry);
            self.notify_changed(&[entry], &[]);
        }
    }

    /// Selects every entity admitted by `filter` across the rectangular region
    /// `[min_x, max_x] x [min_y, max_y]` on floor `z`.
    pub fn select_region(&mut self, map: &ChunkedMap, min_x: i32, min_y: i32, max_x: i32, max_y: i32, z: u8, filter: &SelectionFilter) {
        let (min_x, max_x) = (min_x.min(max_x), min_x.max(max_x));
        let (min_y, max_y) = (min_y.min(max_y), min_y.max(max_y));

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let pos = Position::new(x, y, z);
                if let Some(tile) = map.get_tile(pos) {
                    self.add_tile_entities(pos, tile, filter);
                }
            }
        }
    }

    /// Convenience wrapper over [`Self::select_at`] that selects every entity kind on the
    /// tile.
    pub fn select_tile(&mut self, map: &ChunkedMap, pos: Position) {
        self.select_at(map, pos, &SelectionFilter::all(), false);
    }

    /// Deselects the entities at `pos` admitted by `filter`.
    pub fn deselect_at(&mut self, pos: Position, filter: &SelectionFilter) {
        let mut removed = Vec::new();
        for entry in self.bucket.entries_at(pos) {
            if filter.matches(entry.id) {
                self.bucket.remove(entry.id);
                removed.push(entry);
            }
        }
        self.notify_changed(&[], &removed);
    }

    /// For every entity at `pos` admitted by `filter`: deselects it if selected, selects it
    /// otherwise.
    pub fn toggle_at(&mut self, map: &ChunkedMap, pos: Position, filter: &SelectionFilter) {
        let Some(tile) = map.get_tile(pos) else { return };
        let candidates = Self::tile_entries(pos, tile, filter);

        let mut added = Vec::new();
        let mut removed = Vec::new();
        for entry in candidates {
            if self.bucket.contains(entry.id) {
                self.bucket.remove(entry.id);
                removed.push(entry);
            } else {
                self.bucket.add(entry);
                added.push(entry);
            }
        }
        self.notify_changed(&added, &removed);
    }

    pub fn clear(&mut self) {
        if self.bucket.is_empty() {
            return;
        }
        self.bucket.clear();
        self.notify_cleared();
    }

    pub fn add_entity(&mut self, entry: SelectionEntry) {
        if self.bucket.contains(entry.id) {
            return;
        }
        self.bucket.add(entry);
        self.notify_changed(&[entry], &[]);
    }

    pub fn remove_entity(&mut self, id: EntityId) {
        let Some(entry) = self.bucket.entries_at(id.position).into_iter().find(|e| e.id == id) else { return };
        self.bucket.remove(id);
        self.notify_changed(&[], &[entry]);
    }

    pub fn toggle_entity(&mut self, entry: SelectionEntry) {
        if self.bucket.contains(entry.id) {
            self.bucket.remove(entry.id);
            self.notify_changed(&[], &[entry]);
        } else {
            self.bucket.add(entry);
            self.notify_changed(&[entry], &[]);
        }
    }

    pub fn remove_all_at(&mut self, pos: Position) {
        let removed = self.bucket.entries_at(pos);
        if removed.is_empty() {
            return;
        }
        self.bucket.remove_all_at(pos);
        self.notify_changed(&[], &removed);
    }

    pub fn is_empty(&self) -> bool {
        self.bucket.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bucket.len()
    }

    pub fn is_selected(&self, id: EntityId) -> bool {
        self.bucket.contains(id)
    }

    pub fn has_selection_at(&self, pos: Position) -> bool {
        self.bucket.has_entries_at(pos)
    }

    pub fn entries_at(&self, pos: Position) -> Vec<SelectionEntry> {
        self.bucket.entries_at(pos)
    }

    pub fn all_entries(&self) -> Vec<SelectionEntry> {
        self.bucket.all_entries()
    }

    pub fn positions(&self) -> Vec<Position> {
        self.bucket.positions()
    }

    pub fn min_bound(&self) -> Position {
        self.bucket.min_bound()
    }

    pub fn max_bound(&self) -> Position {
        self.bucket.max_bound()
    }

    pub fn entries_on_floor(&self, z: u8) -> Vec<SelectionEntry> {
        self.bucket.entries_on_floor(z)
    }

    pub fn create_snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot::capture(&self.bucket)
    }

    /// Replaces the current selection entirely with `snapshot`'s contents, notifying once
    /// as a bulk change.
    pub fn restore_snapshot(&mut self, snapshot: &SelectionSnapshot) {
        let removed = self.bucket.all_entries();
        self.bucket = snapshot.restore();
        let added = self.bucket.all_entries();
        self.notify_changed(&added, &removed);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use std::cell::RefCell;

    use super::*;
    use mapcore_datatypes::Item;

    #[derive(Default)]
    struct RecordingObserver {
        changed: RefCell<Vec<(Vec<SelectionEntry>, Vec<SelectionEntry>)>>,
        cleared: RefCell<u32>,
    }

    impl SelectionObserver for RecordingObserver {
        fn on_selection_changed(&self, added: &[SelectionEntry], removed: &[SelectionEntry]) {
            self.changed.borrow_mut().push((added.to_vec(), removed.to_vec()));
        }
        fn on_selection_cleared(&self) {
            *self.cleared.borrow_mut() += 1;
        }
    }

    fn map_with_tile() -> (ChunkedMap, Position) {
        let mut map = ChunkedMap::new();
        let pos = Position::new(1, 1, 7);
        let tile = map.get_or_create_tile(pos);
        tile.set_ground(Item::new(100));
        tile.add_item_direct(Item::new(200));
        (map, pos)
    }

    #[test]
    fn select_tile_picks_up_ground_and_items() {
        let (map, pos) = map_with_tile();
        let mut service = SelectionService::new();
        service.select_tile(&map, pos);

        assert_eq!(service.len(), 2);
        assert!(service.is_selected(EntityId::ground(pos)));
        assert!(service.is_selected(EntityId::item(pos, 0)));
    }

    #[test]
    fn select_single_at_prefers_creature_over_items_and_ground() {
        let (map, pos) = map_with_tile();
        let mut service = SelectionService::new();
        service.select_single_at(&map, pos, &SelectionFilter::all(), false);

        assert_eq!(service.len(), 1);
        assert!(service.is_selected(EntityId::item(pos, 0)));
    }

    #[test]
    fn select_single_at_prefers_spawn_over_everything_else() {
        use mapcore_datatypes::Spawn;

        let (mut map, pos) = map_with_tile();
        map.get_or_create_tile(pos).spawn = Some(Spawn::new(pos, 3));

        let mut service = SelectionService::new();
        service.select_single_at(&map, pos, &SelectionFilter::all(), false);

        assert_eq!(service.len(), 1);
        assert!(service.is_selected(EntityId::spawn(pos)));
    }

    #[test]
    fn toggle_at_flips_selection_state() {
        let (map, pos) = map_with_tile();
        let mut service = SelectionService::new();
        service.select_tile(&map, pos);
        service.toggle_at(&map, pos, &SelectionFilter::all());

        assert!(service.is_empty());
    }

    #[test]
    fn clear_notifies_observers_once() {
        let (map, pos) = map_with_tile();
        let mut service = SelectionService::new();
        let recording = Rc::new(RecordingObserver::default());
        let observer: Rc<dyn SelectionObserver> = recording.clone();
        service.register_observer(&observer);

        service.select_tile(&map, pos);
        service.clear();

        assert_eq!(*recording.cleared.borrow(), 1);
    }

    #[test]
    fn snapshot_round_trips_selection_state() {
        let (map, pos) = map_with_tile();
        let mut service = SelectionService::new();
        service.select_tile(&map, pos);

        let snapshot = service.create_snapshot();
        service.clear();
        assert!(service.is_empty());

        service.restore_snapshot(&snapshot);
        assert_eq!(service.len(), 2);
    }
}
