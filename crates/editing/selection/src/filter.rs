use mapcore_datatypes::{EntityId, EntityType};

/// Controls which entity kinds a selection operation affects. A `specific_entity` filter
/// overrides the per-kind flags entirely and matches only that one entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionFilter {
    pub include_ground:    bool,
    pub include_items:     bool,
    pub include_creatures: bool,
    pub include_spawns:    bool,
    pub specific_entity:   Option<EntityId>,
}

impl SelectionFilter {
    pub fn all() -> Self {
        Self { include_ground: true, include_items: true, include_creatures: true, include_spawns: true, specific_entity: None }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn items_only() -> Self {
        Self { include_items: true, ..Self::none() }
    }

    pub fn items_and_ground() -> Self {
        Self { include_ground: true, include_items: true, ..Self::none() }
    }

    pub fn single_entity(id: EntityId) -> Self {
        Self { specific_entity: Some(id), ..Self::none() }
    }

    fn includes(&self, entity_type: EntityType) -> bool {
        match entity_type {
            EntityType::Ground   => self.include_ground,
            EntityType::Item     => self.include_items,
            EntityType::Creature => self.include_creatures,
            EntityType::Spawn    => self.include_spawns,
        }
    }

    pub fn matches(&self, id: EntityId) -> bool {
        match self.specific_entity {
            Some(specific) => id == specific,
            None => self.includes(id.entity_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapcore_datatypes::Position;

    #[test]
    fn all_matches_every_entity() {
        let filter = SelectionFilter::all();
        let pos = Position::new(1, 1, 7);
        for id in [EntityId::ground(pos), EntityId::item(pos, 1), EntityId::creature(pos), EntityId::spawn(pos)] {
            assert!(filter.matches(id));
        }
    }

    #[test]
    fn none_matches_nothing() {
        let filter = SelectionFilter::none();
        assert!(!filter.matches(EntityId::ground(Position::new(0, 0, 7))));
    }

    #[test]
    fn single_entity_matches_only_that_entity() {
        let pos = Position::new(1, 1, 7);
        let id = EntityId::item(pos, 5);
        let filter = SelectionFilter::single_entity(id);

        assert!(filter.matches(id));
        assert!(!filter.matches(EntityId::item(pos, 6)));
    }
}
