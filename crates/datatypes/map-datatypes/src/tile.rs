use crate::creature::{Creature, Spawn};
use crate::item::Item;
use crate::position::Position;

/// Tile-level flags, stored as a plain bitset rather than pulling in a bitflags-style crate
/// for five bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileFlags(u32);

impl TileFlags {
    pub const PROTECTION_ZONE: u32 = 1 << 0;
    pub const NO_PVP:          u32 = 1 << 1;
    pub const NO_LOGOUT:       u32 = 1 << 2;
    pub const PVP_ZONE:        u32 = 1 << 3;
    pub const REFRESH:         u32 = 1 << 4;

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u32, enabled: bool) {
        if enabled {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

/// A heuristic for whether an item belongs in the ground slot: ground items are the broad
/// class of "floor" server ids, which in the original client descriptor table is a property
/// of the item type. Without a descriptor table loaded, the only reliable signal left is
/// position: the first item seen for a tile, whatever it is, becomes ground. Callers that do
/// have a descriptor table should perform this check themselves and call
/// [`Tile::set_ground`] directly rather than relying on promotion via [`Tile::add_item`].
fn is_ground_candidate(tile: &Tile) -> bool {
    tile.ground.is_none()
}

/// One tile of the map: at most one ground item, an ordered stack of non-ground items, flags,
/// an optional house id, and at most one each of a spawn and a creature.
///
/// Move-only by convention (nothing here derives `Copy`, and `Clone` exists only for
/// snapshotting): a tile's identity is its position, and duplicating one in place would be
/// a bug everywhere this crate is used from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tile {
    pub position: Position,
    pub ground:   Option<Item>,
    pub items:    Vec<Item>,
    pub flags:    TileFlags,
    pub house_id: u32,
    pub spawn:    Option<Spawn>,
    pub creature: Option<Creature>,
}

impl Tile {
    pub fn new(position: Position) -> Self {
        Self { position, ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.ground.is_none()
            && self.items.is_empty()
            && self.house_id == 0
            && self.spawn.is_none()
            && self.creature.is_none()
            && self.flags == TileFlags::default()
    }

    pub fn set_ground(&mut self, item: Item) {
        self.ground = Some(item);
    }

    /// Appends `item`, promoting it to ground if no ground is set yet. Used by interactive
    /// editing (brushes, paste) where "the first thing placed becomes the floor" is the
    /// expected behaviour.
    pub fn add_item(&mut self, item: Item) {
        if is_ground_candidate(self) {
            self.ground = Some(item);
        } else {
            self.items.push(item);
        }
    }

    /// Appends `item` to the stacked-items vector without any ground promotion, preserving
    /// exact on-disk/snapshot order. Used by deserialisation and snapshot restore.
    pub fn add_item_direct(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Removes every stacked item matching `predicate`, returning whether anything was
    /// removed. Does not touch the ground slot.
    pub fn remove_items_if(&mut self, mut predicate: impl FnMut(&Item) -> bool) -> bool {
        let before = self.items.len();
        self.items.retain(|item| !predicate(item));
        self.items.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_added_item_becomes_ground() {
        let mut tile = Tile::new(Position::default());
        tile.add_item(Item::new(1));
        tile.add_item(Item::new(2));

        assert_eq!(tile.ground.as_ref().unwrap().server_id, 1);
        assert_eq!(tile.items.len(), 1);
        assert_eq!(tile.items[0].server_id, 2);
    }

    #[test]
    fn add_item_direct_never_promotes_to_ground() {
        let mut tile = Tile::new(Position::default());
        tile.add_item_direct(Item::new(1));

        assert!(tile.ground.is_none());
        assert_eq!(tile.items.len(), 1);
    }

    #[test]
    fn remove_items_if_only_touches_stacked_items() {
        let mut tile = Tile::new(Position::default());
        tile.set_ground(Item::new(100));
        tile.add_item_direct(Item::new(200));
        tile.add_item_direct(Item::new(200));
        tile.add_item_direct(Item::new(300));

        let removed = tile.remove_items_if(|item| item.server_id == 200);

        assert!(removed);
        assert!(tile.ground.is_some());
        assert_eq!(tile.items.len(), 1);
        assert_eq!(tile.items[0].server_id, 300);
    }
}
