use std::collections::HashMap;

use indexmap::IndexMap;
use mapcore_datatypes::{EntityId, Position};

/// One selected entity: its identity plus a cached item server id (0 for non-items), so
/// copy/paste and rendering don't need to look the entity back up on the map to know what it
/// is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionEntry {
    pub id:      EntityId,
    pub item_id: u16,
}

impl SelectionEntry {
    pub fn new(id: EntityId) -> Self {
        Self { id, item_id: 0 }
    }

    pub fn with_item_id(id: EntityId, item_id: u16) -> Self {
        Self { id, item_id }
    }

    pub fn position(&self) -> Position {
        self.id.position
    }
}

/// Pure data container for selection state: no map access, no notifications. Dual-indexed so
/// that "what is selected?" and "what is selected at this position?" are both O(1)-ish:
/// `entries` is the source of truth, `position_index` is a secondary index kept in lockstep.
#[derive(Debug, Clone, Default)]
pub struct SelectionBucket {
    entries:        IndexMap<EntityId, SelectionEntry>,
    position_index: HashMap<u64, Vec<EntityId>>,
}

impl SelectionBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry`, a no-op if that entity is already selected.
    pub fn add(&mut self, entry: SelectionEntry) {
        if self.entries.contains_key(&entry.id) {
            return;
        }
        self.position_index.entry(entry.id.position.pack()).or_default().push(entry.id);
        self.entries.insert(entry.id, entry);
    }

    /// Removes the entity identified by `id`, a no-op if it wasn't selected.
    pub fn remove(&mut self, id: EntityId) {
        if self.entries.shift_remove(&id).is_none() {
            return;
        }
        let pos_key = id.position.pack();
        if let Some(ids) = self.position_index.get_mut(&pos_key) {
            ids.retain(|&other| other != id);
            if ids.is_empty() {
                self.position_index.remove(&pos_key);
            }
        }
    }

    /// Removes every entry at `pos`.
    pub fn remove_all_at(&mut self, pos: Position) {
        let Some(ids) = self.position_index.remove(&pos.pack()) else { return };
        for id in ids {
            self.entries.shift_remove(&id);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.position_index.clear();
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn has_entries_at(&self, pos: Position) -> bool {
        self.position_index.contains_key(&pos.pack())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries_at(&self, pos: Position) -> Vec<SelectionEntry> {
        self.position_index
            .get(&pos.pack())
            .into_iter()
            .flatten()
            .filter_map(|id| self.entries.get(id).copied())
            .collect()
    }

    pub fn all_entries(&self) -> Vec<SelectionEntry> {
        self.entries.values().copied().collect()
    }

    pub fn positions(&self) -> Vec<Position> {
        self.position_index.keys().map(|&packed| Position::unpack(packed)).collect()
    }

    /// The minimum corner of the selection's axis-aligned bounding box, or the origin if
    /// empty.
    pub fn min_bound(&self) -> Position {
        self.fold_bound(i32::MAX, i32::MAX, u8::MAX, i32::min, i32::min, u8::min)
    }

    /// The maximum corner of the selection's axis-aligned bounding box, or the origin if
    /// empty.
    pub fn max_bound(&self) -> Position {
        self.fold_bound(i32::MIN, i32::MIN, 0, i32::max, i32::max, u8::max)
    }

    fn fold_bound(
        &self,
        init_x: i32,
        init_y: i32,
        init_z: u8,
        fold_x: impl Fn(i32, i32) -> i32,
        fold_y: impl Fn(i32, i32) -> i32,
        fold_z: impl Fn(u8, u8) -> u8,
    ) -> Position {
        if self.entries.is_empty() {
            return Position::new(0, 0, 0);
        }
        let (mut x, mut y, mut z) = (init_x, init_y, init_z);
        for entry in self.entries.values() {
            let pos = entry.position();
            x = fold_x(x, pos.x);
            y = fold_y(y, pos.y);
            z = fold_z(z, pos.z);
        }
        Position::new(x, y, z)
    }

    pub fn entries_on_floor(&self, z: u8) -> Vec<SelectionEntry> {
        self.entries.values().filter(|entry| entry.position().z == z).copied().collect()
    }

    pub fn positions_on_floor(&self, z: u8) -> Vec<Position> {
        let mut seen = std::collections::HashSet::new();
        let mut result = Vec::new();
        for entry in self.entries.values() {
            let pos = entry.position();
            if pos.z == z && seen.insert(pos.pack()) {
                result.push(pos);
            }
        }
        result
    }
}
