use std::collections::HashMap;

use mapcore_datatypes::{ChunkedMap, Position, Tile};
use mapcore_selection::SelectionService;

use crate::buffer::{HistoryBuffer, HistoryConfig};
use crate::entry::{ActionType, HistoryEntry};
use crate::snapshot::TileSnapshot;

/// Stateful recorder that groups a batch of tile mutations into one undoable
/// [`HistoryEntry`]. Every user-visible action that mutates tiles should be wrapped in one
/// `begin_operation`/`end_operation` pair; starting a second operation while one is active
/// logs a warning and discards the first rather than nesting.
#[derive(Debug)]
pub struct HistoryManager {
    buffer: HistoryBuffer,

    operation_active:  bool,
    current_description: String,
    current_type:      ActionType,
    before_states:     HashMap<Position, TileSnapshot>,
    selection_before:  Option<mapcore_selection::SelectionSnapshot>,
}

impl HistoryManager {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            buffer: HistoryBuffer::new(config),
            operation_active: false,
            current_description: String::new(),
            current_type: ActionType::Other,
            before_states: HashMap::new(),
            selection_before: None,
        }
    }

    pub fn begin_operation(&mut self, description: impl Into<String>, action_type: ActionType, selection: Option<&SelectionService>) {
        if self.operation_active {
            log::warn!("history: begin_operation called while an operation was already active, canceling it");
            self.cancel_operation();
        }

        self.operation_active = true;
        self.current_description = description.into();
        self.current_type = action_type;
        self.before_states.clear();
        self.selection_before = selection.map(SelectionService::create_snapshot);
    }

    pub fn record_tile_before(&mut self, pos: Position, tile: Option<&Tile>) {
        if !self.operation_active {
            log::warn!("history: record_tile_before called without an active operation");
            return;
        }
        self.before_states.entry(pos).or_insert_with(|| TileSnapshot::capture(tile, pos));
    }

    pub fn end_operation(&mut self, map: &ChunkedMap, selection: Option<&SelectionService>) {
        if !self.operation_active {
            log::warn!("history: end_operation called without an active operation");
            return;
        }

        let has_tile_changes = !self.before_states.is_empty();
        let has_selection_changes = self.selection_before.is_some();

        if !has_tile_changes && !has_selection_changes {
            self.operation_active = false;
            self.before_states.clear();
            self.selection_before = None;
            return;
        }

        let mut entry = HistoryEntry::new(std::mem::take(&mut self.current_description), self.current_type);
        for (pos, before_snapshot) in self.before_states.drain() {
            entry.add_before_snapshot(before_snapshot);
            entry.add_after_snapshot(TileSnapshot::capture(map.get_tile(pos), pos));
        }

        if let Some(selection_before) = self.selection_before.take() {
            entry.set_selection_before(selection_before);
            if let Some(selection) = selection {
                entry.set_selection_after(selection.create_snapshot());
            }
        }

        self.buffer.push(entry);
        self.operation_active = false;

        log::debug!("history: end operation");
    }

    pub fn cancel_operation(&mut self) {
        self.operation_active = false;
        self.before_states.clear();
        self.selection_before = None;
    }

    pub fn is_operation_active(&self) -> bool {
        self.operation_active
    }

    /// Convenience for a single-tile change that's already been applied: captures the before
    /// state and begins an operation, so the caller still needs to follow up with
    /// `end_operation` once the map reflects the after state.
    pub fn record_single_tile_change(&mut self, map: &ChunkedMap, pos: Position, description: impl Into<String>, action_type: ActionType) {
        let before = TileSnapshot::capture(map.get_tile(pos), pos);
        self.begin_operation(description, action_type, None);
        self.before_states.insert(pos, before);
    }

    pub fn undo(&mut self, map: &mut ChunkedMap, selection: Option<&mut SelectionService>) -> Option<String> {
        let entry = self.buffer.move_back()?;
        let description = entry.description().to_owned();
        entry.undo(map, selection);
        log::debug!("history: undo {description}");
        Some(description)
    }

    pub fn redo(&mut self, map: &mut ChunkedMap, selection: Option<&mut SelectionService>) -> Option<String> {
        let entry = self.buffer.move_forward()?;
        let description = entry.description().to_owned();
        entry.redo(map, selection);
        log::debug!("history: redo {description}");
        Some(description)
    }

    pub fn can_undo(&self) -> bool {
        self.buffer.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.buffer.can_redo()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.buffer.undo_description()
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.buffer.redo_description()
    }

    pub fn memory_usage(&self) -> usize {
        self.buffer.total_memory()
    }

    pub fn entry_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapcore_datatypes::Item;

    #[test]
    fn full_begin_record_mutate_end_undo_redo_cycle() {
        let mut map = ChunkedMap::new();
        let pos = Position::new(1, 1, 7);
        let mut manager = HistoryManager::new(HistoryConfig::default());

        manager.begin_operation("place item", ActionType::Draw, None);
        manager.record_tile_before(pos, map.get_tile(pos));
        map.get_or_create_tile(pos).set_ground(Item::new(42));
        manager.end_operation(&map, None);

        assert_eq!(manager.entry_count(), 1);
        assert!(manager.can_undo());

        let description = manager.undo(&mut map, None).unwrap();
        assert_eq!(description, "place item");
        assert!(map.get_tile(pos).is_none());

        manager.redo(&mut map, None).unwrap();
        assert_eq!(map.get_tile(pos).unwrap().ground.as_ref().unwrap().server_id, 42);
    }

    #[test]
    fn record_tile_before_only_captures_the_first_state_per_position() {
        let mut map = ChunkedMap::new();
        let pos = Position::new(0, 0, 7);
        map.get_or_create_tile(pos).set_ground(Item::new(1));

        let mut manager = HistoryManager::new(HistoryConfig::default());
        manager.begin_operation("overwrite", ActionType::Draw, None);
        manager.record_tile_before(pos, map.get_tile(pos));

        map.get_or_create_tile(pos).set_ground(Item::new(2));
        manager.record_tile_before(pos, map.get_tile(pos));

        manager.end_operation(&map, None);
        manager.undo(&mut map, None);

        assert_eq!(map.get_tile(pos).unwrap().ground.as_ref().unwrap().server_id, 1);
    }

    #[test]
    fn end_operation_without_changes_does_not_push_an_entry() {
        let map = ChunkedMap::new();
        let mut manager = HistoryManager::new(HistoryConfig::default());
        manager.begin_operation("noop", ActionType::Other, None);
        manager.end_operation(&map, None);

        assert_eq!(manager.entry_count(), 0);
        assert!(!manager.can_undo());
    }

    #[test]
    fn cancel_operation_discards_recorded_state() {
        let mut map = ChunkedMap::new();
        let pos = Position::new(2, 2, 7);
        let mut manager = HistoryManager::new(HistoryConfig::default());

        manager.begin_operation("aborted", ActionType::Draw, None);
        manager.record_tile_before(pos, map.get_tile(pos));
        manager.cancel_operation();

        map.get_or_create_tile(pos).set_ground(Item::new(9));
        manager.end_operation(&map, None);

        assert_eq!(manager.entry_count(), 0);
    }

    #[test]
    fn beginning_an_operation_while_one_is_active_cancels_the_first() {
        let map = ChunkedMap::new();
        let mut manager = HistoryManager::new(HistoryConfig::default());

        manager.begin_operation("first", ActionType::Draw, None);
        manager.record_tile_before(Position::new(0, 0, 7), map.get_tile(Position::new(0, 0, 7)));
        manager.begin_operation("second", ActionType::Draw, None);

        assert!(manager.is_operation_active());
        manager.end_operation(&map, None);
        assert_eq!(manager.entry_count(), 0);
    }
}
