use std::cell::Cell;

use crate::position::Position;

/// Compass direction a creature faces. `South` is the default spawn direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    North,
    East,
    #[default]
    South,
    West,
}

/// A creature's visual outfit. Left opaque here; asset/sprite resolution is outside this
/// crate's scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outfit {
    pub look_type: u16,
    pub head:      u8,
    pub body:      u8,
    pub legs:      u8,
    pub feet:      u8,
}

/// A creature. When attached to a tile, the tile's own position is authoritative; `position`
/// is still kept on the value itself so that a creature can be carried around standalone
/// (brush placement, clipboard) before it's attached anywhere.
///
/// `selected` is visual-only bookkeeping for the editor UI: it's mutable through a shared
/// reference, the same way the original keeps it `mutable` on an otherwise logically-const
/// value.
#[derive(Debug, Clone)]
pub struct Creature {
    pub name:       String,
    pub spawn_time: i32,
    pub direction:  Direction,
    pub outfit:     Outfit,
    pub position:   Position,
    selected:       Cell<bool>,
}

impl Creature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:       name.into(),
            spawn_time: 60,
            direction:  Direction::South,
            outfit:     Outfit::default(),
            position:   Position::default(),
            selected:   Cell::new(false),
        }
    }

    pub fn is_selected(&self) -> bool {
        self.selected.get()
    }

    pub fn select(&self) {
        self.selected.set(true);
    }

    pub fn deselect(&self) {
        self.selected.set(false);
    }
}

impl PartialEq for Creature {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.spawn_time == other.spawn_time
            && self.direction == other.direction
            && self.outfit == other.outfit
            && self.position == other.position
    }
}

/// A spawn point: a center position and a radius, in tiles. Creatures aren't members of a
/// spawn directly; at save time, a spawn enumerates creatures found on tiles within its
/// radius on the same floor.
#[derive(Debug, Clone)]
pub struct Spawn {
    pub center: Position,
    pub radius: i32,
    selected:   Cell<bool>,
}

impl Spawn {
    pub fn new(center: Position, radius: i32) -> Self {
        Self { center, radius, selected: Cell::new(false) }
    }

    pub fn is_selected(&self) -> bool {
        self.selected.get()
    }

    pub fn select(&self) {
        self.selected.set(true);
    }

    pub fn deselect(&self) {
        self.selected.set(false);
    }

    /// Whether `pos` (assumed to be on the same floor as this spawn) lies within its radius,
    /// using the same square (Chebyshev) distance the brush engine's square shape uses.
    pub fn contains(&self, pos: Position) -> bool {
        (pos.x - self.center.x).abs() <= self.radius && (pos.y - self.center.y).abs() <= self.radius
    }
}

impl PartialEq for Spawn {
    fn eq(&self, other: &Self) -> bool {
        self.center == other.center && self.radius == other.radius
    }
}

impl Default for Spawn {
    fn default() -> Self {
        Self::new(Position::default(), 0)
    }
}
