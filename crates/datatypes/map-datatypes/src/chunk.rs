use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::rc::{Rc, Weak};

use crate::position::Position;
use crate::tile::Tile;

/// Edge length of a [`Chunk`], in tiles. Chosen as a power of two so that chunk/local
/// coordinate splitting is a shift-and-mask rather than a division.
pub const CHUNK_EDGE: i32 = 32;
const CHUNK_SHIFT: u32 = 5;
const CHUNK_MASK: i32 = CHUNK_EDGE - 1;

fn chunk_coords(pos: Position) -> (i32, i32, u8) {
    (pos.x >> CHUNK_SHIFT, pos.y >> CHUNK_SHIFT, pos.z)
}

fn local_index(pos: Position) -> u16 {
    let local_x = (pos.x & CHUNK_MASK) as u16;
    let local_y = (pos.y & CHUNK_MASK) as u16;
    local_y * (CHUNK_EDGE as u16) + local_x
}

/// A fixed-size 2D block of tiles on one floor, stored sparsely. Empty chunks cost nothing
/// but a hash map entry; whether they're evicted once their last tile is removed is an
/// implementation detail [`ChunkedMap`] decides, not something callers observe.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    tiles: HashMap<u16, Tile>,
    dirty: bool,
}

impl Chunk {
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Tiles in this chunk, in row-major order (sorted by local index, which is exactly
    /// `local_y * CHUNK_EDGE + local_x`).
    pub fn tiles_sorted(&self) -> Vec<&Tile> {
        let mut entries: Vec<_> = self.tiles.iter().collect();
        entries.sort_unstable_by_key(|(index, _)| **index);
        entries.into_iter().map(|(_, tile)| tile).collect()
    }
}

/// A live mutable borrow of a tile already on the map, handed out by
/// [`ChunkedMap::get_tile_mut`]. Marks its chunk dirty and fires [`MapChangeObserver::on_tile_changed`]
/// on drop, so any mutation made through the handle propagates the same way [`ChunkedMap::set_tile`]'s
/// does, regardless of what the caller actually changed.
#[derive(Debug)]
pub struct TileHandle<'a> {
    tile:      &'a mut Tile,
    dirty:     &'a mut bool,
    observers: &'a mut Vec<Weak<dyn MapChangeObserver>>,
    pos:       Position,
}

impl Deref for TileHandle<'_> {
    type Target = Tile;

    fn deref(&self) -> &Tile {
        self.tile
    }
}

impl DerefMut for TileHandle<'_> {
    fn deref_mut(&mut self) -> &mut Tile {
        self.tile
    }
}

impl Drop for TileHandle<'_> {
    fn drop(&mut self) {
        *self.dirty = true;
        let pos = self.pos;
        self.observers.retain(|observer| observer.upgrade().inspect(|o| o.on_tile_changed(pos)).is_some());
    }
}

/// Observes structural changes to a [`ChunkedMap`]: tile edits and spawn placement/removal.
/// Implemented by external collaborators such as a minimap texture cache. Observers are held
/// by weak reference, so a dropped observer is simply skipped on the next notification rather
/// than needing explicit unregistration.
pub trait MapChangeObserver {
    fn on_tile_changed(&self, _pos: Position) {}
    fn on_spawn_changed(&self, _pos: Position, _added: bool) {}
}

/// A town's registered entry: a name and a temple (respawn) position.
#[derive(Debug, Clone, PartialEq)]
pub struct Town {
    pub id:              u32,
    pub name:            String,
    pub temple_position: Position,
}

/// A named waypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub name:     String,
    pub position: Position,
}

/// Version information carried over from the map container's header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapVersion {
    pub otbm_version: u32,
    pub items_major:  u32,
    pub items_minor:  u32,
}

/// A sparse, chunked 3D tile store, plus the map-wide metadata that travels with the map
/// container (size, description, sidecar filenames, towns, waypoints, version).
///
/// Positions outside the declared `(width, height)` bounds are permitted: they simply create
/// chunks outside the declared area, since an untouched chunk costs nothing.
#[derive(Default)]
pub struct ChunkedMap {
    chunks: HashMap<(i32, i32, u8), Chunk>,

    pub width:       u16,
    pub height:      u16,
    pub description: String,
    pub spawn_file:  String,
    pub house_file:  String,
    pub towns:       Vec<Town>,
    pub waypoints:   Vec<Waypoint>,
    pub version:     MapVersion,

    observers: Vec<Weak<dyn MapChangeObserver>>,
}

impl ChunkedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_observer(&mut self, observer: &Rc<dyn MapChangeObserver>) {
        self.observers.push(Rc::downgrade(observer));
    }

    fn notify_tile_changed(&mut self, pos: Position) {
        self.observers.retain(|observer| {
            observer.upgrade().inspect(|o| o.on_tile_changed(pos)).is_some()
        });
    }

    pub fn notify_spawn_change(&mut self, pos: Position, added: bool) {
        self.observers.retain(|observer| {
            observer.upgrade().inspect(|o| o.on_spawn_changed(pos, added)).is_some()
        });
    }

    pub fn get_tile(&self, pos: Position) -> Option<&Tile> {
        self.chunks.get(&chunk_coords(pos))?.tiles.get(&local_index(pos))
    }

    /// Borrows the tile at `pos` for mutation. The returned [`TileHandle`] marks its chunk
    /// dirty and notifies [`MapChangeObserver`]s when it's dropped, the same way [`Self::set_tile`]
    /// does immediately, so any caller that reaches for this instead of `set_tile` still keeps
    /// external caches in sync.
    pub fn get_tile_mut(&mut self, pos: Position) -> Option<TileHandle<'_>> {
        let chunk = self.chunks.get_mut(&chunk_coords(pos))?;
        let tile = chunk.tiles.get_mut(&local_index(pos))?;
        Some(TileHandle { tile, dirty: &mut chunk.dirty, observers: &mut self.observers, pos })
    }

    pub fn get_or_create_tile(&mut self, pos: Position) -> &mut Tile {
        let chunk = self.chunks.entry(chunk_coords(pos)).or_default();
        chunk.mark_dirty();
        chunk.tiles.entry(local_index(pos)).or_insert_with(|| Tile::new(pos))
    }

    pub fn set_tile(&mut self, pos: Position, mut tile: Tile) {
        tile.position = pos;
        let chunk = self.chunks.entry(chunk_coords(pos)).or_default();
        chunk.tiles.insert(local_index(pos), tile);
        chunk.mark_dirty();
        self.notify_tile_changed(pos);
    }

    /// Removes the tile at `pos`, if any. The containing chunk is left in place even if now
    /// empty; chunk eviction is not required by this crate's contract.
    pub fn remove_tile(&mut self, pos: Position) -> Option<Tile> {
        let chunk = self.chunks.get_mut(&chunk_coords(pos))?;
        let removed = chunk.tiles.remove(&local_index(pos));
        if removed.is_some() {
            chunk.mark_dirty();
            self.notify_tile_changed(pos);
        }
        removed
    }

    pub fn chunk_at(&self, chunk_x: i32, chunk_y: i32, z: u8) -> Option<&Chunk> {
        self.chunks.get(&(chunk_x, chunk_y, z))
    }

    /// Iterates every chunk's coordinates in a stable order (sorted by `(z, chunk_y,
    /// chunk_x)`), so that callers walking the whole map see a deterministic floor-major,
    /// row-major traversal.
    fn sorted_chunk_keys(&self) -> Vec<(i32, i32, u8)> {
        let mut keys: Vec<_> = self.chunks.keys().copied().collect();
        keys.sort_unstable_by_key(|&(cx, cy, z)| (z, cy, cx));
        keys
    }

    pub fn for_each_tile(&self, mut f: impl FnMut(&Tile)) {
        for key in self.sorted_chunk_keys() {
            for tile in self.chunks[&key].tiles_sorted() {
                f(tile);
            }
        }
    }

    pub fn for_each_tile_on_floor(&self, z: u8, mut f: impl FnMut(&Tile)) {
        for key in self.sorted_chunk_keys().into_iter().filter(|&(_, _, kz)| kz == z) {
            for tile in self.chunks[&key].tiles_sorted() {
                f(tile);
            }
        }
    }

    pub fn for_each_tile_mut(&mut self, mut f: impl FnMut(&mut Tile)) {
        for key in self.sorted_chunk_keys() {
            if let Some(chunk) = self.chunks.get_mut(&key) {
                for tile in chunk.tiles.values_mut() {
                    f(tile);
                }
            }
        }
    }

    pub fn for_each_tile_on_floor_mut(&mut self, z: u8, mut f: impl FnMut(&mut Tile)) {
        for key in self.sorted_chunk_keys().into_iter().filter(|&(_, _, kz)| kz == z) {
            if let Some(chunk) = self.chunks.get_mut(&key) {
                for tile in chunk.tiles.values_mut() {
                    f(tile);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_tile_is_idempotent() {
        let mut map = ChunkedMap::new();
        let pos = Position::new(5, 5, 7);

        map.get_or_create_tile(pos).house_id = 3;
        assert_eq!(map.get_tile(pos).unwrap().house_id, 3);
    }

    #[test]
    fn remove_tile_drops_it_but_keeps_the_chunk() {
        let mut map = ChunkedMap::new();
        let pos = Position::new(1, 1, 7);
        map.get_or_create_tile(pos);

        assert!(map.remove_tile(pos).is_some());
        assert!(map.get_tile(pos).is_none());
        assert!(map.chunk_at(0, 0, 7).is_some());
    }

    #[test]
    fn for_each_tile_visits_in_deterministic_order() {
        let mut map = ChunkedMap::new();
        map.set_tile(Position::new(1, 0, 7), Tile::new(Position::default()));
        map.set_tile(Position::new(0, 0, 7), Tile::new(Position::default()));
        map.set_tile(Position::new(0, 1, 7), Tile::new(Position::default()));

        let mut seen = Vec::new();
        map.for_each_tile(|tile| seen.push((tile.position.x, tile.position.y)));

        // set_tile overwrote `position` on each tile to match its key, so this should come
        // back row-major: y=0 row (x=0, x=1), then y=1 row.
        assert_eq!(seen, vec![(0, 0), (1, 0), (0, 1)]);
    }

    #[test]
    fn positions_outside_declared_bounds_still_work() {
        let mut map = ChunkedMap::new();
        map.width = 10;
        map.height = 10;

        let pos = Position::new(10_000, 10_000, 7);
        map.get_or_create_tile(pos).house_id = 1;
        assert_eq!(map.get_tile(pos).unwrap().house_id, 1);
    }
}
