use crate::position::Position;

/// The kind of entity an [`EntityId`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Ground,
    Item,
    Creature,
    Spawn,
}

/// Identifies one addressable entity on the map: a position, what kind of thing it is, and
/// (for stacked items) which one. `local_id` is always 0 for `Ground` and `Spawn`, since at
/// most one of each exists per tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId {
    pub position:    Position,
    pub entity_type: EntityType,
    pub local_id:    u64,
}

impl EntityId {
    pub fn new(position: Position, entity_type: EntityType, local_id: u64) -> Self {
        Self { position, entity_type, local_id }
    }

    pub fn ground(position: Position) -> Self {
        Self::new(position, EntityType::Ground, 0)
    }

    pub fn spawn(position: Position) -> Self {
        Self::new(position, EntityType::Spawn, 0)
    }

    pub fn creature(position: Position) -> Self {
        Self::new(position, EntityType::Creature, 0)
    }

    pub fn item(position: Position, local_id: u64) -> Self {
        Self::new(position, EntityType::Item, local_id)
    }

    /// A 64-bit hash combining all three fields, used as the primary key of a selection
    /// bucket. Not `Hash::hash` itself, since callers sometimes need a cheap numeric key to
    /// store directly rather than go through a `HashMap`'s own hasher.
    pub fn combined_hash(&self) -> u64 {
        const GOLDEN_RATIO: u64 = 0x9e37_79b9_7f4a_7c15;

        let mut h = self.position.pack();
        h ^= (self.entity_type as u64).wrapping_mul(GOLDEN_RATIO);
        h ^= self.local_id.wrapping_mul(GOLDEN_RATIO);
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_entities_on_the_same_tile_hash_differently() {
        let pos = Position::new(10, 20, 7);
        let ground = EntityId::ground(pos);
        let item_a = EntityId::item(pos, 1);
        let item_b = EntityId::item(pos, 2);

        assert_ne!(ground.combined_hash(), item_a.combined_hash());
        assert_ne!(item_a.combined_hash(), item_b.combined_hash());
    }
}
