use mapcore_datatypes::{ChunkedMap, Position};
use mapcore_selection::{SelectionService, SelectionSnapshot};

use crate::compression::{compress, decompress};
use crate::snapshot::TileSnapshot;

/// Coarse category for a history entry, letting future stroke-coalescing or UI grouping key
/// off of what kind of change happened rather than just its description string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    Draw,
    Move,
    Paste,
    Delete,
    Reorder,
    Properties,
    Spawn,
    Other,
}

/// One undoable operation: a set of before/after tile snapshot pairs, plus an optional
/// before/after selection snapshot pair. Snapshots are index-aligned:
/// `before[i]`/`after[i]` both refer to the same position.
#[derive(Debug)]
pub struct HistoryEntry {
    description: String,
    action_type: ActionType,

    before: Vec<TileSnapshot>,
    after:  Vec<TileSnapshot>,

    before_original_sizes: Vec<usize>,
    after_original_sizes:  Vec<usize>,
    compressed: bool,

    selection_before: Option<SelectionSnapshot>,
    selection_after:  Option<SelectionSnapshot>,
}

/// Below this size, compressing a snapshot isn't worth the CPU — the LZ4 frame header alone
/// eats into the savings.
const MIN_COMPRESS_SIZE: usize = 64;

impl HistoryEntry {
    pub fn new(description: impl Into<String>, action_type: ActionType) -> Self {
        Self {
            description: description.into(),
            action_type,
            before: Vec::new(),
            after:  Vec::new(),
            before_original_sizes: Vec::new(),
            after_original_sizes:  Vec::new(),
            compressed: false,
            selection_before: None,
            selection_after:  None,
        }
    }

    pub fn add_before_snapshot(&mut self, snapshot: TileSnapshot) {
        self.before.push(snapshot);
    }

    pub fn add_after_snapshot(&mut self, snapshot: TileSnapshot) {
        self.after.push(snapshot);
    }

    pub fn set_selection_before(&mut self, snapshot: SelectionSnapshot) {
        self.selection_before = Some(snapshot);
    }

    pub fn set_selection_after(&mut self, snapshot: SelectionSnapshot) {
        self.selection_after = Some(snapshot);
    }

    pub fn has_selection_change(&self) -> bool {
        self.selection_before.is_some()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    pub fn has_changes(&self) -> bool {
        !self.before.is_empty()
    }

    pub fn tile_count(&self) -> usize {
        self.before.len()
    }

    /// Compresses every stored snapshot larger than [`MIN_COMPRESS_SIZE`], recording each
    /// snapshot's original length so decompression knows the target size. A no-op if
    /// already compressed, since a `HistoryBuffer` push compresses once on entry and entries
    /// are otherwise immutable.
    pub fn compress(&mut self, enable: bool) {
        if !enable || self.compressed {
            return;
        }

        for snapshot in &mut self.before {
            let original_size = snapshot.data_size();
            self.before_original_sizes.push(original_size);
            if original_size > MIN_COMPRESS_SIZE {
                if let Some(compressed) = compress(snapshot.data()) {
                    snapshot.set_data(compressed);
                }
            }
        }
        for snapshot in &mut self.after {
            let original_size = snapshot.data_size();
            self.after_original_sizes.push(original_size);
            if original_size > MIN_COMPRESS_SIZE {
                if let Some(compressed) = compress(snapshot.data()) {
                    snapshot.set_data(compressed);
                }
            }
        }

        self.compressed = true;
    }

    fn apply_snapshots(&self, map: &mut ChunkedMap, snapshots: &[TileSnapshot], original_sizes: &[usize]) {
        for (index, snapshot) in snapshots.iter().enumerate() {
            let pos = snapshot.position();
            let original_size = original_sizes.get(index).copied();

            let restored = match original_size {
                Some(original_size) if self.compressed && original_size > MIN_COMPRESS_SIZE => {
                    match decompress(snapshot.data(), original_size) {
                        Some(raw) => TileSnapshot::with_data(pos, raw).restore(),
                        None => {
                            log::warn!("failed to decompress history snapshot at {pos:?}, skipping");
                            continue;
                        }
                    }
                }
                _ => snapshot.restore(),
            };

            match restored {
                Ok(Some(tile)) => map.set_tile(pos, tile),
                Ok(None) => { map.remove_tile(pos); }
                Err(error) => log::warn!("dropping malformed history snapshot at {pos:?}: {error}"),
            }
        }
    }

    pub fn undo(&self, map: &mut ChunkedMap, selection: Option<&mut SelectionService>) {
        self.apply_snapshots(map, &self.before, &self.before_original_sizes);
        if let (Some(selection), Some(snapshot)) = (selection, &self.selection_before) {
            selection.restore_snapshot(snapshot);
        }
    }

    pub fn redo(&self, map: &mut ChunkedMap, selection: Option<&mut SelectionService>) {
        self.apply_snapshots(map, &self.after, &self.after_original_sizes);
        if let (Some(selection), Some(snapshot)) = (selection, &self.selection_after) {
            selection.restore_snapshot(snapshot);
        }
    }

    pub fn memsize(&self) -> usize {
        let mut size = std::mem::size_of::<Self>() + self.description.capacity();
        size += self.before.iter().map(TileSnapshot::memsize).sum::<usize>();
        size += self.after.iter().map(TileSnapshot::memsize).sum::<usize>();
        size += self.before_original_sizes.capacity() * std::mem::size_of::<usize>();
        size += self.after_original_sizes.capacity() * std::mem::size_of::<usize>();
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapcore_datatypes::Item;

    #[test]
    fn undo_restores_the_before_state_and_redo_restores_after() {
        let pos = Position::new(0, 0, 7);
        let mut map = ChunkedMap::new();
        map.get_or_create_tile(pos).set_ground(Item::new(1));

        let mut entry = HistoryEntry::new("place item", ActionType::Draw);
        entry.add_before_snapshot(TileSnapshot::capture(map.get_tile(pos), pos));

        map.get_or_create_tile(pos).set_ground(Item::new(2));
        entry.add_after_snapshot(TileSnapshot::capture(map.get_tile(pos), pos));

        entry.undo(&mut map, None);
        assert_eq!(map.get_tile(pos).unwrap().ground.as_ref().unwrap().server_id, 1);

        entry.redo(&mut map, None);
        assert_eq!(map.get_tile(pos).unwrap().ground.as_ref().unwrap().server_id, 2);
    }

    #[test]
    fn undo_of_a_newly_created_tile_removes_it() {
        let pos = Position::new(5, 5, 7);
        let mut map = ChunkedMap::new();

        let mut entry = HistoryEntry::new("create tile", ActionType::Draw);
        entry.add_before_snapshot(TileSnapshot::capture(None, pos));
        map.get_or_create_tile(pos).set_ground(Item::new(1));
        entry.add_after_snapshot(TileSnapshot::capture(map.get_tile(pos), pos));

        entry.undo(&mut map, None);
        assert!(map.get_tile(pos).is_none());
    }

    #[test]
    fn compress_round_trips_through_undo() {
        let pos = Position::new(0, 0, 7);
        let mut map = ChunkedMap::new();
        let mut tile = mapcore_datatypes::Tile::new(pos);
        for i in 0..40u16 {
            tile.add_item_direct(Item::new(i));
        }
        map.set_tile(pos, tile);

        let mut entry = HistoryEntry::new("big stack", ActionType::Draw);
        entry.add_before_snapshot(TileSnapshot::capture(map.get_tile(pos), pos));
        map.remove_tile(pos);
        entry.add_after_snapshot(TileSnapshot::capture(None, pos));
        entry.compress(true);

        entry.undo(&mut map, None);
        assert_eq!(map.get_tile(pos).unwrap().items.len(), 40);
    }
}
